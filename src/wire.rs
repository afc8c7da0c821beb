use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use futures::Sink;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{AuthSource, DefaultServerParameterProvider, LoginInfo, Password, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use tokio::net::TcpStream;

use crate::engine::{Engine, EngineError, SlotError};
use crate::observability;
use crate::sql::{self, Command, SqlError};

pub struct TrackHoursHandler {
    engine: Arc<Engine>,
    query_parser: Arc<TrackHoursQueryParser>,
}

impl TrackHoursHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            query_parser: Arc::new(TrackHoursQueryParser),
        }
    }

    /// Parse and run one statement, recording query metrics.
    async fn run(&self, query: &str) -> PgWireResult<Response> {
        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        let label = observability::command_label(&cmd);
        let start = Instant::now();
        let result = self.execute_command(cmd).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status).increment(1);
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        result
    }

    async fn execute_command(&self, cmd: Command) -> PgWireResult<Response> {
        let engine = &self.engine;
        match cmd {
            Command::InsertTrack { id, name } => {
                engine.create_track(id, name).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("INSERT").with_rows(1)))
            }
            Command::DeleteTrack { id } => {
                engine.delete_track(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::InsertSlot { track_id, slot } => {
                engine.add_slot(track_id, slot).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("INSERT").with_rows(1)))
            }
            Command::ReplaceHours { track_id, slots } => {
                let count = slots.len();
                engine.replace_hours(track_id, slots).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("INSERT").with_rows(count)))
            }
            Command::DeleteSlot { track_id, index } => {
                engine.remove_slot(track_id, index).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::SelectHours { track_id } => {
                let hours = engine.get_hours(track_id).await.map_err(engine_err)?;
                let schema = Arc::new(hours_schema());
                let tid = track_id.to_string();
                let rows: Vec<PgWireResult<_>> = hours
                    .into_iter()
                    .enumerate()
                    .map(|(index, slot)| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&tid)?;
                        encoder.encode_field(&(index as i64))?;
                        encoder.encode_field(&slot.start_day.to_string())?;
                        encoder.encode_field(&slot.end_day.to_string())?;
                        encoder.encode_field(&slot.open_time.to_string())?;
                        encoder.encode_field(&slot.close_time.to_string())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(Response::Query(QueryResponse::new(schema, stream::iter(rows))))
            }
            Command::SelectTracks { filter } => {
                let tracks = engine.search_tracks(&filter).await;
                let schema = Arc::new(tracks_schema());
                let rows: Vec<PgWireResult<_>> = tracks
                    .into_iter()
                    .map(|track| {
                        let hours = serde_json::to_string(&track.hours).map_err(|e| {
                            PgWireError::ApiError(Box::new(e))
                        })?;
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&track.id.to_string())?;
                        encoder.encode_field(&track.name)?;
                        encoder.encode_field(&(track.hours.len() as i64))?;
                        encoder.encode_field(&hours)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(Response::Query(QueryResponse::new(schema, stream::iter(rows))))
            }
            Command::CheckSlot { track_id, slot } => {
                let verdict = engine.check_slot(track_id, &slot).await.map_err(engine_err)?;
                let (accepted, reason) = match verdict {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                };
                let schema = Arc::new(check_schema());
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&accepted)?;
                encoder.encode_field(&reason)?;
                let rows: Vec<PgWireResult<_>> = vec![Ok(encoder.take_row())];
                Ok(Response::Query(QueryResponse::new(schema, stream::iter(rows))))
            }
        }
    }
}

fn text_field(name: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text)
}

fn hours_schema() -> Vec<FieldInfo> {
    vec![
        text_field("track_id", Type::VARCHAR),
        text_field("slot_index", Type::INT8),
        text_field("start_day", Type::VARCHAR),
        text_field("end_day", Type::VARCHAR),
        text_field("open_time", Type::VARCHAR),
        text_field("close_time", Type::VARCHAR),
    ]
}

fn tracks_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id", Type::VARCHAR),
        text_field("name", Type::VARCHAR),
        text_field("slot_count", Type::INT8),
        text_field("hours", Type::VARCHAR),
    ]
}

fn check_schema() -> Vec<FieldInfo> {
    vec![text_field("accepted", Type::BOOL), text_field("reason", Type::VARCHAR)]
}

/// Row description for a statement that has not been executed yet.
fn result_schema(sql: &str) -> Vec<FieldInfo> {
    let upper = sql.trim_start().to_uppercase();
    if !upper.starts_with("SELECT") {
        return vec![];
    }
    if upper.contains("HOURS_CHECK") {
        check_schema()
    } else if upper.contains("TRACK_HOURS") {
        hours_schema()
    } else if upper.contains("TRACKS") {
        tracks_schema()
    } else {
        vec![]
    }
}

#[async_trait]
impl SimpleQueryHandler for TrackHoursHandler {
    async fn do_query<C>(
        &self,
        _client: &mut C,
        query: &str,
    ) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(vec![self.run(query).await?])
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct TrackHoursQueryParser;

#[async_trait]
impl QueryParser for TrackHoursQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(result_schema(stmt))
    }
}

#[async_trait]
impl ExtendedQueryHandler for TrackHoursHandler {
    type Statement = String;
    type QueryParser = TrackHoursQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let sql = substitute_params(&portal.statement.statement, &portal.parameters);
        self.run(&sql).await
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(param_types, result_schema(&target.statement)))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(result_schema(&target.statement.statement)))
    }
}

/// `$N` placeholders outside single-quoted literals, as (byte span, N).
/// A doubled quote inside a literal toggles twice and stays inside.
fn placeholders(sql: &str) -> Vec<(Range<usize>, usize)> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut in_literal = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                in_literal = !in_literal;
                i += 1;
            }
            b'$' if !in_literal => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start
                    && let Ok(n) = sql[start..end].parse::<usize>()
                {
                    found.push((i..end, n));
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    found
}

/// Count the highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    placeholders(sql).into_iter().map(|(_, n)| n).max().unwrap_or(0)
}

/// Substitute $1, $2, ... placeholders with bound parameter values (text
/// format) in one pass over the statement, so bound text is never rescanned.
fn substitute_params<P: AsRef<[u8]>>(sql: &str, params: &[Option<P>]) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut copied = 0;
    for (span, n) in placeholders(sql) {
        let Some(param) = n.checked_sub(1).and_then(|i| params.get(i)) else {
            continue;
        };
        result.push_str(&sql[copied..span.start]);
        match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes.as_ref());
                result.push('\'');
                result.push_str(&text.replace('\'', "''"));
                result.push('\'');
            }
            None => result.push_str("NULL"),
        }
        copied = span.end;
    }
    result.push_str(&sql[copied..]);
    result
}

// ── Auth ─────────────────────────────────────────────────────────

/// Single shared password; any user name is accepted.
#[derive(Debug)]
pub struct TrackHoursAuthSource {
    password: String,
}

impl TrackHoursAuthSource {
    pub fn new(password: String) -> Self {
        Self { password }
    }
}

#[async_trait]
impl AuthSource for TrackHoursAuthSource {
    async fn get_password(&self, _login: &LoginInfo) -> PgWireResult<Password> {
        Ok(Password::new(None, self.password.as_bytes().to_vec()))
    }
}

// ── Factory ──────────────────────────────────────────────────────

pub struct TrackHoursFactory {
    handler: Arc<TrackHoursHandler>,
    auth_handler:
        Arc<CleartextPasswordAuthStartupHandler<TrackHoursAuthSource, DefaultServerParameterProvider>>,
    noop: Arc<NoopHandler>,
}

impl TrackHoursFactory {
    pub fn new(engine: Arc<Engine>, password: String) -> Self {
        Self {
            handler: Arc::new(TrackHoursHandler::new(engine)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                TrackHoursAuthSource::new(password),
                DefaultServerParameterProvider::default(),
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for TrackHoursFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client connection until it closes.
pub async fn process_connection(socket: TcpStream, engine: Arc<Engine>, password: String) -> std::io::Result<()> {
    let factory = Arc::new(TrackHoursFactory::new(engine, password));
    pgwire::tokio::process_socket(socket, None, factory).await
}

// ── Errors ───────────────────────────────────────────────────────

fn user_error(code: &str, message: String) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new("ERROR".into(), code.into(), message)))
}

/// SQLSTATE for an engine failure.
fn engine_sqlstate(e: &EngineError) -> &'static str {
    match e.slot_error() {
        Some(SlotError::InvalidTimeOrder) => "22023",
        Some(SlotError::OverlapConflict { .. }) => "23P01",
        None => "P0001",
    }
}

fn engine_err(e: EngineError) -> PgWireError {
    user_error(engine_sqlstate(&e), e.to_string())
}

fn sql_err(e: SqlError) -> PgWireError {
    user_error("42601", e.to_string())
}
