use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage, SimpleQueryRow};
use ulid::Ulid;

use trackhours::engine::Engine;
use trackhours::wire;

// ── Test infrastructure ──────────────────────────────────────

async fn start_test_server() -> (SocketAddr, Arc<Engine>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let dir = std::env::temp_dir().join(format!("trackhours_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let engine = Arc::new(Engine::new(dir.join("trackhours.wal")).unwrap());

    let served = engine.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let engine = served.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, engine, "trackhours".to_string()).await;
            });
        }
    });

    (addr, engine)
}

async fn connect(addr: SocketAddr, password: &str) -> Result<Client, tokio_postgres::Error> {
    let mut config = Config::new();
    config
        .host(addr.ip().to_string())
        .port(addr.port())
        .dbname("trackhours")
        .user("platform")
        .password(password);

    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(client)
}

async fn rows(client: &Client, sql: &str) -> Vec<SimpleQueryRow> {
    client
        .simple_query(sql)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|msg| match msg {
            SimpleQueryMessage::Row(row) => Some(row),
            _ => None,
        })
        .collect()
}

fn sqlstate(err: &tokio_postgres::Error) -> Option<&str> {
    err.code().map(|c| c.code())
}

async fn add_slot(client: &Client, tid: Ulid, start: &str, end: &str, open: &str, close: &str) -> Result<(), tokio_postgres::Error> {
    client
        .batch_execute(&format!(
            "INSERT INTO track_hours (track_id, start_day, end_day, open_time, close_time) \
             VALUES ('{tid}', '{start}', '{end}', '{open}', '{close}')"
        ))
        .await
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_password_is_refused() {
    let (addr, _engine) = start_test_server().await;
    assert!(connect(addr, "nope").await.is_err());
}

#[tokio::test]
async fn create_track_and_list_hours() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    client
        .batch_execute(&format!("INSERT INTO tracks (id, name) VALUES ('{tid}', 'Monza')"))
        .await
        .unwrap();
    add_slot(&client, tid, "Saturday", "Saturday", "10:00", "14:00").await.unwrap();
    add_slot(&client, tid, "Monday", "Friday", "9:00", "17:00").await.unwrap();

    let hours = rows(&client, &format!("SELECT * FROM track_hours WHERE track_id = '{tid}'")).await;
    assert_eq!(hours.len(), 2);
    assert_eq!(hours[0].get("slot_index"), Some("0"));
    assert_eq!(hours[0].get("start_day"), Some("Monday"));
    assert_eq!(hours[0].get("end_day"), Some("Friday"));
    assert_eq!(hours[0].get("open_time"), Some("09:00"));
    assert_eq!(hours[1].get("start_day"), Some("Saturday"));

    assert_eq!(engine.get_hours(tid).await.unwrap().len(), 2);
}

#[tokio::test]
async fn overlapping_slot_reports_exclusion_violation() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    client
        .batch_execute(&format!("INSERT INTO tracks (id) VALUES ('{tid}')"))
        .await
        .unwrap();
    add_slot(&client, tid, "Monday", "Friday", "09:00", "17:00").await.unwrap();

    let err = add_slot(&client, tid, "Wednesday", "Wednesday", "10:00", "12:00")
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("23P01"));

    let err = add_slot(&client, tid, "Sunday", "Sunday", "18:00", "08:00")
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("22023"));

    let err = add_slot(&client, tid, "sunday", "Sunday", "08:00", "18:00")
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("42601"));

    // The connection stays usable after rejections.
    add_slot(&client, tid, "Saturday", "Saturday", "10:00", "14:00").await.unwrap();
}

#[tokio::test]
async fn hours_check_is_a_dry_run() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    engine.create_track(tid, None).await.unwrap();
    add_slot(&client, tid, "Monday", "Friday", "09:00", "17:00").await.unwrap();

    let check = |day: &str, open: &str, close: &str| {
        format!(
            "SELECT * FROM hours_check WHERE track_id = '{tid}' AND start_day = '{day}' \
             AND end_day = '{day}' AND open_time = '{open}' AND close_time = '{close}'"
        )
    };

    let verdict = rows(&client, &check("Wednesday", "10:00", "12:00")).await;
    assert_eq!(verdict.len(), 1);
    assert_eq!(verdict[0].get("accepted"), Some("f"));
    assert_eq!(verdict[0].get("reason"), Some("this slot overlaps an existing one"));

    let verdict = rows(&client, &check("Saturday", "10:00", "12:00")).await;
    assert_eq!(verdict[0].get("accepted"), Some("t"));
    assert_eq!(verdict[0].get("reason"), Some(""));

    assert_eq!(engine.get_hours(tid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_tracks_by_weekday() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let weekday_track = Ulid::new();
    let weekend_track = Ulid::new();
    for (id, name) in [(weekday_track, "Imola"), (weekend_track, "Mugello")] {
        client
            .batch_execute(&format!("INSERT INTO tracks (id, name) VALUES ('{id}', '{name}')"))
            .await
            .unwrap();
    }
    add_slot(&client, weekday_track, "Monday", "Friday", "09:00", "17:00").await.unwrap();
    add_slot(&client, weekend_track, "Friday", "Sunday", "20:00", "02:00").await.unwrap();

    let found = rows(&client, "SELECT * FROM tracks WHERE weekday IN ('Saturday', 'Sunday')").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("id"), Some(weekend_track.to_string().as_str()));
    assert_eq!(found[0].get("name"), Some("Mugello"));
    assert_eq!(found[0].get("slot_count"), Some("1"));

    let hours: serde_json::Value = serde_json::from_str(found[0].get("hours").unwrap()).unwrap();
    assert_eq!(
        hours,
        serde_json::json!([{
            "startDay": "Friday",
            "endDay": "Sunday",
            "open_time": "20:00",
            "close_time": "02:00",
        }])
    );

    let friday = rows(&client, "SELECT * FROM tracks WHERE weekday = 'Friday'").await;
    assert_eq!(friday.len(), 2);

    let all = rows(&client, "SELECT * FROM tracks").await;
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn replace_and_remove_over_the_wire() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    engine.create_track(tid, None).await.unwrap();

    let hours = r#"[{"startDay":"Saturday","endDay":"Saturday","open_time":"10:00","close_time":"14:00"},{"startDay":"Monday","endDay":"Friday","open_time":"09:00","close_time":"17:00"}]"#;
    client
        .batch_execute(&format!("INSERT INTO track_schedules (track_id, hours) VALUES ('{tid}', '{hours}')"))
        .await
        .unwrap();

    let clash = r#"[{"startDay":"Monday","endDay":"Monday","open_time":"09:00","close_time":"10:00"},{"startDay":"Monday","endDay":"Monday","open_time":"09:30","close_time":"11:00"}]"#;
    let err = client
        .batch_execute(&format!("INSERT INTO track_schedules (track_id, hours) VALUES ('{tid}', '{clash}')"))
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("23P01"));
    assert_eq!(engine.get_hours(tid).await.unwrap().len(), 2);

    client
        .batch_execute(&format!("DELETE FROM track_hours WHERE track_id = '{tid}' AND slot_index = 0"))
        .await
        .unwrap();
    let left = rows(&client, &format!("SELECT * FROM track_hours WHERE track_id = '{tid}'")).await;
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].get("start_day"), Some("Saturday"));

    let err = client
        .batch_execute(&format!("DELETE FROM track_hours WHERE track_id = '{tid}' AND slot_index = 5"))
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("P0001"));
}

#[tokio::test]
async fn extended_protocol_with_parameters() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new().to_string();
    let inserted = client
        .execute("INSERT INTO tracks (id, name) VALUES ($1, $2)", &[&tid, &"Suzuka"])
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    client
        .execute(
            "INSERT INTO track_hours (track_id, start_day, end_day, open_time, close_time) VALUES ($1, $2, $3, $4, $5)",
            &[&tid, &"Thursday", &"Thursday", &"18:00", &"22:00"],
        )
        .await
        .unwrap();

    let hours = engine.get_hours(Ulid::from_string(&tid).unwrap()).await.unwrap();
    assert_eq!(hours.len(), 1);
    assert_eq!(hours[0].open_time.to_string(), "18:00");
}

#[tokio::test]
async fn parameter_values_are_not_rescanned() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    let name = "Entry $1 per lap, driver's choice";
    client
        .execute("INSERT INTO tracks (id, name) VALUES ($1, $2)", &[&tid.to_string(), &name])
        .await
        .unwrap();

    let info = engine.get_track_info(tid).await.unwrap();
    assert_eq!(info.name.as_deref(), Some(name));
}

#[tokio::test]
async fn delete_track_over_the_wire() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr, "trackhours").await.unwrap();

    let tid = Ulid::new();
    engine.create_track(tid, Some("Fuji".into())).await.unwrap();
    client
        .batch_execute(&format!("DELETE FROM tracks WHERE id = '{tid}'"))
        .await
        .unwrap();
    assert_eq!(engine.track_count(), 0);

    let err = client
        .batch_execute(&format!("SELECT * FROM track_hours WHERE track_id = '{tid}'"))
        .await
        .unwrap_err();
    assert_eq!(sqlstate(&err), Some("P0001"));
}
