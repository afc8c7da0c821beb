use sqlparser::ast::{self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::engine::{DayQuery, DaySet, TrackFilter};
use crate::limits::MAX_FILTER_DAYS;
use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertTrack {
        id: Ulid,
        name: Option<String>,
    },
    DeleteTrack {
        id: Ulid,
    },
    InsertSlot {
        track_id: Ulid,
        slot: AvailabilitySlot,
    },
    /// Whole-list save from the track editor.
    ReplaceHours {
        track_id: Ulid,
        slots: Vec<AvailabilitySlot>,
    },
    DeleteSlot {
        track_id: Ulid,
        index: usize,
    },
    SelectHours {
        track_id: Ulid,
    },
    SelectTracks {
        filter: TrackFilter,
    },
    CheckSlot {
        track_id: Ulid,
        slot: AvailabilitySlot,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    let Some(stmt) = stmts.first() else {
        return Err(SqlError::Empty);
    };

    match stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let values = extract_insert_values(insert)?;

    match table.as_str() {
        "tracks" => {
            if values.is_empty() {
                return Err(SqlError::WrongArity("tracks", 1, 0));
            }
            let id = parse_ulid(&values[0])?;
            let name = match values.get(1) {
                Some(v) => parse_string_or_null(v)?,
                None => None,
            };
            Ok(Command::InsertTrack { id, name })
        }
        "track_hours" => {
            if values.len() < 5 {
                return Err(SqlError::WrongArity("track_hours", 5, values.len()));
            }
            Ok(Command::InsertSlot {
                track_id: parse_ulid(&values[0])?,
                slot: AvailabilitySlot::new(
                    parse_weekday(&values[1])?,
                    parse_weekday(&values[2])?,
                    parse_time(&values[3])?,
                    parse_time(&values[4])?,
                ),
            })
        }
        "track_schedules" => {
            if values.len() < 2 {
                return Err(SqlError::WrongArity("track_schedules", 2, values.len()));
            }
            let track_id = parse_ulid(&values[0])?;
            let json = parse_string(&values[1])?;
            let slots: Vec<AvailabilitySlot> =
                serde_json::from_str(&json).map_err(|e| SqlError::Parse(format!("bad hours JSON: {e}")))?;
            Ok(Command::ReplaceHours { track_id, slots })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    let mut filters = Filters::default();
    if let Some(selection) = &delete.selection {
        extract_filters(selection, &mut filters)?;
    }

    match table.as_str() {
        "tracks" => Ok(Command::DeleteTrack {
            id: filters.id.ok_or(SqlError::MissingFilter("id"))?,
        }),
        "track_hours" => Ok(Command::DeleteSlot {
            track_id: filters.track_id.ok_or(SqlError::MissingFilter("track_id"))?,
            index: filters.slot_index.ok_or(SqlError::MissingFilter("slot_index"))?,
        }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filters = Filters::default();
    if let Some(selection) = &select.selection {
        extract_filters(selection, &mut filters)?;
    }

    match table.as_str() {
        "track_hours" => Ok(Command::SelectHours {
            track_id: filters.track_id.ok_or(SqlError::MissingFilter("track_id"))?,
        }),
        "tracks" => Ok(Command::SelectTracks {
            filter: filters.track_filter()?,
        }),
        "hours_check" => Ok(Command::CheckSlot {
            track_id: filters.track_id.ok_or(SqlError::MissingFilter("track_id"))?,
            slot: filters.candidate_slot()?,
        }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// Column predicates collected from a `WHERE` clause of `=` comparisons
/// joined by `AND`, plus `weekday IN (...)`.
#[derive(Debug, Default)]
struct Filters {
    id: Option<Ulid>,
    track_id: Option<Ulid>,
    slot_index: Option<usize>,
    start_day: Option<Weekday>,
    end_day: Option<Weekday>,
    open_time: Option<TimeOfDay>,
    close_time: Option<TimeOfDay>,
    weekdays: Option<DaySet>,
    from_day: Option<Weekday>,
    to_day: Option<Weekday>,
    window_open: Option<TimeOfDay>,
    window_close: Option<TimeOfDay>,
}

impl Filters {
    fn candidate_slot(&self) -> Result<AvailabilitySlot, SqlError> {
        Ok(AvailabilitySlot::new(
            self.start_day.ok_or(SqlError::MissingFilter("start_day"))?,
            self.end_day.ok_or(SqlError::MissingFilter("end_day"))?,
            self.open_time.ok_or(SqlError::MissingFilter("open_time"))?,
            self.close_time.ok_or(SqlError::MissingFilter("close_time"))?,
        ))
    }

    fn track_filter(&self) -> Result<TrackFilter, SqlError> {
        let range = match (self.from_day, self.to_day) {
            (Some(from), Some(to)) => Some(DayQuery::Range { from, to }),
            (Some(_), None) => return Err(SqlError::MissingFilter("to_day")),
            (None, Some(_)) => return Err(SqlError::MissingFilter("from_day")),
            (None, None) => None,
        };
        let days = match (self.weekdays, range) {
            (Some(_), Some(_)) => {
                return Err(SqlError::Unsupported("weekday IN together with from_day/to_day".into()));
            }
            (Some(set), None) => Some(DayQuery::Days(set)),
            (None, range) => range,
        };
        let window = match (self.window_open, self.window_close) {
            (Some(open), Some(close)) => Some((open, close)),
            (Some(_), None) => return Err(SqlError::MissingFilter("window_close")),
            (None, Some(_)) => return Err(SqlError::MissingFilter("window_open")),
            (None, None) => None,
        };
        Ok(TrackFilter { days, window })
    }
}

fn set_once<T>(slot: &mut Option<T>, column: &str, value: T) -> Result<(), SqlError> {
    if slot.is_some() {
        return Err(SqlError::Unsupported(format!("more than one predicate on {column}")));
    }
    *slot = Some(value);
    Ok(())
}

fn extract_filters(expr: &Expr, filters: &mut Filters) -> Result<(), SqlError> {
    match expr {
        Expr::Nested(inner) => extract_filters(inner, filters)?,
        Expr::BinaryOp { left, op, right } => match op {
            ast::BinaryOperator::And => {
                extract_filters(left, filters)?;
                extract_filters(right, filters)?;
            }
            ast::BinaryOperator::Eq => {
                let column = expr_column_name(left)
                    .ok_or_else(|| SqlError::Unsupported(format!("WHERE clause {expr}")))?;
                match column.as_str() {
                    "id" => set_once(&mut filters.id, "id", parse_ulid(right)?)?,
                    "track_id" => set_once(&mut filters.track_id, "track_id", parse_ulid(right)?)?,
                    "slot_index" => set_once(&mut filters.slot_index, "slot_index", parse_index(right)?)?,
                    "start_day" => set_once(&mut filters.start_day, "start_day", parse_weekday(right)?)?,
                    "end_day" => set_once(&mut filters.end_day, "end_day", parse_weekday(right)?)?,
                    "open_time" => set_once(&mut filters.open_time, "open_time", parse_time(right)?)?,
                    "close_time" => set_once(&mut filters.close_time, "close_time", parse_time(right)?)?,
                    "weekday" => set_once(&mut filters.weekdays, "weekday", DaySet::single(parse_weekday(right)?))?,
                    "from_day" => set_once(&mut filters.from_day, "from_day", parse_weekday(right)?)?,
                    "to_day" => set_once(&mut filters.to_day, "to_day", parse_weekday(right)?)?,
                    "window_open" => set_once(&mut filters.window_open, "window_open", parse_time(right)?)?,
                    "window_close" => set_once(&mut filters.window_close, "window_close", parse_time(right)?)?,
                    _ => return Err(SqlError::Unsupported(format!("column {column}"))),
                }
            }
            _ => return Err(SqlError::Unsupported(format!("operator {op} in WHERE"))),
        },
        Expr::InList {
            expr: column,
            list,
            negated: false,
        } if expr_column_name(column).as_deref() == Some("weekday") => {
            if list.is_empty() {
                return Err(SqlError::Parse("empty weekday list".into()));
            }
            if list.len() > MAX_FILTER_DAYS {
                return Err(SqlError::Parse(format!(
                    "weekday list has {} entries, max {MAX_FILTER_DAYS}",
                    list.len()
                )));
            }
            let mut days = DaySet::EMPTY;
            for item in list {
                days.insert(parse_weekday(item)?);
            }
            set_once(&mut filters.weekdays, "weekday", days)?;
        }
        other => return Err(SqlError::Unsupported(format!("WHERE clause {other}"))),
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

/// The single `VALUES` row of an insert.
fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row.clone()),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

fn parse_string_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => parse_string(expr).map(Some),
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    let s = parse_string(expr)?;
    Ulid::from_string(&s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
}

fn parse_weekday(expr: &Expr) -> Result<Weekday, SqlError> {
    parse_string(expr)?
        .parse()
        .map_err(|e: ParseError| SqlError::Parse(e.to_string()))
}

fn parse_time(expr: &Expr) -> Result<TimeOfDay, SqlError> {
    parse_string(expr)?
        .parse()
        .map_err(|e: ParseError| SqlError::Parse(e.to_string()))
}

fn parse_index(expr: &Expr) -> Result<usize, SqlError> {
    match extract_value(expr) {
        Some(Value::Number(s, _) | Value::SingleQuotedString(s)) => s
            .parse()
            .map_err(|e| SqlError::Parse(format!("bad slot index {s:?}: {e}"))),
        Some(value) => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday::*;

    const TRACK: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn parse_insert_track() {
        let sql = format!("INSERT INTO tracks (id, name) VALUES ('{TRACK}', 'Spa-Francorchamps')");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertTrack { id, name } => {
                assert_eq!(id.to_string(), TRACK);
                assert_eq!(name.as_deref(), Some("Spa-Francorchamps"));
            }
            _ => panic!("expected InsertTrack, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_track_without_name() {
        let cmd = parse_sql(&format!("INSERT INTO tracks (id) VALUES ('{TRACK}')")).unwrap();
        assert!(matches!(cmd, Command::InsertTrack { name: None, .. }));

        let cmd = parse_sql(&format!("INSERT INTO tracks (id, name) VALUES ('{TRACK}', NULL)")).unwrap();
        assert!(matches!(cmd, Command::InsertTrack { name: None, .. }));
    }

    #[test]
    fn parse_insert_slot() {
        let sql = format!(
            "INSERT INTO track_hours (track_id, start_day, end_day, open_time, close_time) \
             VALUES ('{TRACK}', 'Friday', 'Monday', '22:00', '02:00')"
        );
        let cmd = parse_sql(&sql).unwrap();
        assert_eq!(
            cmd,
            Command::InsertSlot {
                track_id: Ulid::from_string(TRACK).unwrap(),
                slot: AvailabilitySlot::new(Friday, Monday, t("22:00"), t("02:00")),
            }
        );
    }

    #[test]
    fn insert_slot_rejects_bad_weekday_and_time() {
        let lower = format!("INSERT INTO track_hours VALUES ('{TRACK}', 'monday', 'Monday', '09:00', '10:00')");
        assert!(matches!(parse_sql(&lower), Err(SqlError::Parse(_))));

        let bad_time = format!("INSERT INTO track_hours VALUES ('{TRACK}', 'Monday', 'Monday', '24:00', '10:00')");
        assert!(matches!(parse_sql(&bad_time), Err(SqlError::Parse(_))));
    }

    #[test]
    fn insert_slot_wrong_arity() {
        let sql = format!("INSERT INTO track_hours VALUES ('{TRACK}', 'Monday', 'Monday', '09:00')");
        assert!(matches!(parse_sql(&sql), Err(SqlError::WrongArity("track_hours", 5, 4))));
    }

    #[test]
    fn multi_row_insert_is_unsupported() {
        let sql = format!(
            "INSERT INTO track_hours VALUES \
             ('{TRACK}', 'Monday', 'Monday', '09:00', '10:00'), \
             ('{TRACK}', 'Tuesday', 'Tuesday', '09:00', '10:00')"
        );
        assert!(matches!(parse_sql(&sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_replace_hours() {
        let hours = r#"[{"startDay":"Monday","endDay":"Friday","open_time":"09:00","close_time":"17:00"},{"startDay":"Saturday","endDay":"Saturday","open_time":"10:00","close_time":"14:00"}]"#;
        let sql = format!("INSERT INTO track_schedules (track_id, hours) VALUES ('{TRACK}', '{hours}')");
        match parse_sql(&sql).unwrap() {
            Command::ReplaceHours { slots, .. } => {
                assert_eq!(
                    slots,
                    vec![
                        AvailabilitySlot::new(Monday, Friday, t("09:00"), t("17:00")),
                        AvailabilitySlot::new(Saturday, Saturday, t("10:00"), t("14:00")),
                    ]
                );
            }
            other => panic!("expected ReplaceHours, got {other:?}"),
        }
    }

    #[test]
    fn replace_hours_empty_list_clears() {
        let sql = format!("INSERT INTO track_schedules VALUES ('{TRACK}', '[]')");
        assert!(matches!(parse_sql(&sql).unwrap(), Command::ReplaceHours { slots, .. } if slots.is_empty()));
    }

    #[test]
    fn replace_hours_bad_json() {
        let sql = format!("INSERT INTO track_schedules VALUES ('{TRACK}', '[{{\"startDay\":\"Mon\"}}]')");
        assert!(matches!(parse_sql(&sql), Err(SqlError::Parse(_))));
    }

    #[test]
    fn parse_delete_track() {
        let cmd = parse_sql(&format!("DELETE FROM tracks WHERE id = '{TRACK}'")).unwrap();
        assert_eq!(cmd, Command::DeleteTrack { id: Ulid::from_string(TRACK).unwrap() });
    }

    #[test]
    fn parse_delete_slot() {
        let cmd = parse_sql(&format!("DELETE FROM track_hours WHERE track_id = '{TRACK}' AND slot_index = 2")).unwrap();
        assert_eq!(
            cmd,
            Command::DeleteSlot {
                track_id: Ulid::from_string(TRACK).unwrap(),
                index: 2,
            }
        );
    }

    #[test]
    fn delete_slot_requires_index() {
        let sql = format!("DELETE FROM track_hours WHERE track_id = '{TRACK}'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::MissingFilter("slot_index"))));
    }

    #[test]
    fn delete_without_where() {
        assert!(matches!(parse_sql("DELETE FROM tracks"), Err(SqlError::MissingFilter("id"))));
    }

    #[test]
    fn parse_select_hours() {
        let cmd = parse_sql(&format!("SELECT * FROM track_hours WHERE track_id = '{TRACK}'")).unwrap();
        assert_eq!(cmd, Command::SelectHours { track_id: Ulid::from_string(TRACK).unwrap() });
    }

    #[test]
    fn parse_select_tracks_unfiltered() {
        let cmd = parse_sql("SELECT * FROM tracks").unwrap();
        assert_eq!(cmd, Command::SelectTracks { filter: TrackFilter::default() });
    }

    #[test]
    fn parse_select_tracks_weekday_list() {
        let cmd = parse_sql("SELECT * FROM tracks WHERE weekday IN ('Saturday', 'Sunday')").unwrap();
        let expected: DaySet = [Saturday, Sunday].into_iter().collect();
        match cmd {
            Command::SelectTracks { filter } => {
                assert_eq!(filter.days, Some(DayQuery::Days(expected)));
                assert_eq!(filter.window, None);
            }
            other => panic!("expected SelectTracks, got {other:?}"),
        }
    }

    #[test]
    fn parse_select_tracks_single_weekday() {
        let cmd = parse_sql("SELECT * FROM tracks WHERE weekday = 'Tuesday'").unwrap();
        assert!(matches!(
            cmd,
            Command::SelectTracks { filter } if filter.days == Some(DayQuery::Days(DaySet::single(Tuesday)))
        ));
    }

    #[test]
    fn parse_select_tracks_range_and_window() {
        let sql = "SELECT * FROM tracks WHERE from_day = 'Friday' AND to_day = 'Sunday' \
                   AND window_open = '18:00' AND window_close = '23:00'";
        match parse_sql(sql).unwrap() {
            Command::SelectTracks { filter } => {
                assert_eq!(filter.days, Some(DayQuery::Range { from: Friday, to: Sunday }));
                assert_eq!(filter.window, Some((t("18:00"), t("23:00"))));
            }
            other => panic!("expected SelectTracks, got {other:?}"),
        }
    }

    #[test]
    fn select_tracks_half_range_is_an_error() {
        assert!(matches!(
            parse_sql("SELECT * FROM tracks WHERE from_day = 'Friday'"),
            Err(SqlError::MissingFilter("to_day"))
        ));
        assert!(matches!(
            parse_sql("SELECT * FROM tracks WHERE window_close = '10:00'"),
            Err(SqlError::MissingFilter("window_open"))
        ));
    }

    #[test]
    fn select_tracks_rejects_list_with_range() {
        let sql = "SELECT * FROM tracks WHERE weekday IN ('Monday') AND from_day = 'Friday' AND to_day = 'Sunday'";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn select_tracks_rejects_oversized_weekday_list() {
        let sql = "SELECT * FROM tracks WHERE weekday IN \
                   ('Monday','Tuesday','Wednesday','Thursday','Friday','Saturday','Sunday','Monday')";
        assert!(matches!(parse_sql(sql), Err(SqlError::Parse(_))));
    }

    #[test]
    fn select_tracks_rejects_or() {
        let sql = "SELECT * FROM tracks WHERE weekday = 'Monday' OR weekday = 'Friday'";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn unknown_where_column_rejected() {
        let err = parse_sql("SELECT * FROM tracks WHERE wekday = 'Monday'").unwrap_err();
        assert!(matches!(&err, SqlError::Unsupported(msg) if msg == "column wekday"));

        let sql = format!("DELETE FROM track_hours WHERE track_id = '{TRACK}' AND slot = 0");
        assert!(matches!(parse_sql(&sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn repeated_predicate_rejected() {
        let sql = "SELECT * FROM tracks WHERE weekday = 'Monday' AND weekday = 'Friday'";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));

        let sql = "SELECT * FROM tracks WHERE weekday IN ('Monday') AND weekday = 'Friday'";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));

        let sql = "SELECT * FROM tracks WHERE window_open = '09:00' AND window_open = '10:00' \
                   AND window_close = '12:00'";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_check_slot() {
        let sql = format!(
            "SELECT * FROM hours_check WHERE track_id = '{TRACK}' AND start_day = 'Wednesday' \
             AND end_day = 'Wednesday' AND open_time = '10:00' AND close_time = '12:00'"
        );
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::CheckSlot {
                track_id: Ulid::from_string(TRACK).unwrap(),
                slot: AvailabilitySlot::new(Wednesday, Wednesday, t("10:00"), t("12:00")),
            }
        );
    }

    #[test]
    fn check_slot_missing_column() {
        let sql = format!("SELECT * FROM hours_check WHERE track_id = '{TRACK}' AND start_day = 'Monday'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::MissingFilter("end_day"))));
    }

    #[test]
    fn empty_query() {
        assert!(matches!(parse_sql(""), Err(SqlError::Empty)));
    }

    #[test]
    fn unknown_table() {
        assert!(matches!(
            parse_sql("SELECT * FROM bookings"),
            Err(SqlError::UnknownTable(t)) if t == "bookings"
        ));
    }

    #[test]
    fn unsupported_statement() {
        assert!(matches!(parse_sql("CREATE TABLE x (a INT)"), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn bad_ulid() {
        assert!(matches!(
            parse_sql("DELETE FROM tracks WHERE id = 'not-a-ulid'"),
            Err(SqlError::Parse(_))
        ));
    }
}
