mod common;

use common::*;
use rowsmith::{
    Comparisons, Error, Filter, Join, JoinColumn, LazyConnection, Mutation, Predicate,
    QueryOptions, Record, Table, TableConfig, Value, temporal,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn players(conn: &Recorder) -> Table<Players, Recorder> {
    Table::new(conn.clone())
}

#[tokio::test]
async fn select_decodes_typed_rows() {
    let conn = Recorder::new();
    conn.respond(vec![
        player_record("1", 3, "2024-02-03 04:05:06"),
        player_record("2", 0, "2024-02-04"),
    ]);

    let rows = players(&conn)
        .select(
            Filter::new().any_of(PlayerCol::SteamId, ["1", "2"]),
            QueryOptions::new().asc(PlayerCol::SteamId),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].visits, 3);
    assert_eq!(
        rows[1].last_update,
        temporal::parse("2024-02-04 00:00:00").unwrap()
    );

    let executed = conn.last();
    assert_eq!(
        executed.sql,
        "SELECT players.* FROM players WHERE (steam_id = ? OR steam_id = ?) ORDER BY steam_id ASC"
    );
    assert_eq!(
        executed.params,
        vec![Value::Text("1".into()), Value::Text("2".into())]
    );
}

#[tokio::test]
async fn lookup_by_id_or_vanity() {
    let conn = Recorder::new();
    let lookup = Filter::new()
        .eq(PlayerCol::SteamId, "gaben")
        .or(Filter::new().eq(PlayerCol::VanityUrl, "gaben"));
    let found = players(&conn)
        .select_one(lookup, QueryOptions::new())
        .await
        .unwrap();

    assert!(found.is_none());
    assert_eq!(
        conn.last().sql,
        "SELECT players.* FROM players WHERE (steam_id = ?) OR (vanity_url = ?) LIMIT 1"
    );
}

#[tokio::test]
async fn select_one_with_limit_two_fails_without_io() {
    let conn = Recorder::new();
    let err = players(&conn)
        .select_one(Predicate::all(), QueryOptions::new().limit(2))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert!(conn.executed().is_empty());
}

#[tokio::test]
async fn stale_rows_by_timestamp() {
    let conn = Recorder::new();
    let cutoff = temporal::parse("2024-01-01 00:00:00").unwrap();
    let filter = Filter::new()
        .lt(PlayerCol::LastUpdate, cutoff)
        .compare(PlayerCol::Visits, Comparisons::new().ne_all([0, 1]));

    players(&conn)
        .select(filter, QueryOptions::new().limit(100))
        .await
        .unwrap();

    let executed = conn.last();
    assert_eq!(
        executed.sql,
        "SELECT players.* FROM players \
         WHERE last_update < ? AND (visits <> ? AND visits <> ?) LIMIT 100"
    );
    assert_eq!(
        executed.params,
        vec![
            Value::Text("2024-01-01 00:00:00".into()),
            Value::Integer(0),
            Value::Integer(1),
        ]
    );
}

#[tokio::test]
async fn insert_serializes_dates_and_skips_absent_columns() {
    let conn = Recorder::new();
    conn.respond(vec![player_record("7", 0, "2024-03-04 05:06:07")]);
    let at = temporal::parse("2024-03-04 05:06:07").unwrap();

    let stored = players(&conn)
        .insert(NewPlayer {
            steam_id: "7".into(),
            last_update: Some(at),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(stored.last_update, at);
    let executed = conn.last();
    assert_eq!(
        executed.sql,
        "INSERT INTO players (steam_id, last_update) VALUES (?, ?) RETURNING *"
    );
    assert_eq!(
        executed.params,
        vec![
            Value::Text("7".into()),
            Value::Text("2024-03-04 05:06:07".into())
        ]
    );
}

#[tokio::test]
async fn insert_many_of_fifty_one_issues_zero_statements() {
    let conn = Recorder::new();
    let batch = (0..51)
        .map(|i| NewPlayer {
            steam_id: i.to_string(),
            ..Default::default()
        })
        .collect();

    let err = players(&conn).insert_many(batch).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(conn.executed().is_empty());
}

#[tokio::test]
async fn insert_many_keeps_rows_before_a_failure() {
    let conn = Recorder::new();
    conn.respond(vec![player_record("a", 0, "2024-01-01")])
        .fail(Error::storage("duplicate key value violates unique constraint"));

    let batch = ["a", "a"]
        .into_iter()
        .map(|id| NewPlayer {
            steam_id: id.into(),
            ..Default::default()
        })
        .collect();
    let err = players(&conn).insert_many(batch).await.unwrap_err();

    assert!(err.is_storage());
    assert_eq!(conn.executed().len(), 2);
}

#[tokio::test]
async fn update_counter_binds_set_then_where() {
    let conn = Recorder::new();
    conn.respond(vec![Record::new()]);

    let changed = players(&conn)
        .update(
            Mutation::new().increment(PlayerCol::Visits, 1),
            Filter::new().eq(PlayerCol::SteamId, 5),
        )
        .await
        .unwrap();

    assert_eq!(changed, 1);
    let executed = conn.last();
    assert_eq!(
        executed.sql,
        "UPDATE players SET visits = visits + ? WHERE steam_id = ?"
    );
    assert_eq!(executed.params, vec![Value::Integer(1), Value::Integer(5)]);
}

#[tokio::test]
async fn numbered_placeholders_span_set_and_where() {
    let conn = Recorder::numbered();
    let stamp = temporal::parse("2024-06-01").unwrap();
    players(&conn)
        .update(
            Mutation::new()
                .set(PlayerCol::LastUpdate, stamp)
                .increment(PlayerCol::Visits, 2),
            Filter::new().eq(PlayerCol::SteamId, "9"),
        )
        .await
        .unwrap();

    assert_eq!(
        conn.last().sql,
        "UPDATE players SET last_update = $1, visits = visits + $2 WHERE steam_id = $3"
    );
}

#[tokio::test]
async fn delete_by_key() {
    let conn = Recorder::new();
    players(&conn)
        .delete(Filter::new().eq(PlayerCol::SteamId, "3"))
        .await
        .unwrap();
    assert_eq!(conn.last().sql, "DELETE FROM players WHERE steam_id = ?");
}

#[tokio::test]
async fn count_with_debug_logging() {
    let conn = Recorder::new();
    conn.respond(vec![Record::new().with("count", 4)]);
    let table: Table<Players, _> =
        Table::with_config(conn.clone(), TableConfig::new().log_sql(true).max_sql_length(16));

    let n = table
        .count(Predicate::all(), QueryOptions::new().debug(true))
        .await
        .unwrap();

    assert_eq!(n, 4);
    assert_eq!(
        conn.last().sql,
        "SELECT COUNT(*) AS count FROM players WHERE 1=1"
    );
}

#[tokio::test]
async fn join_flattens_rows_with_secondary_winning() {
    let conn = Recorder::new();
    conn.respond(vec![
        Record::new()
            .with("steam_id", "1")
            .with("appid", 10)
            .with("playtime", 120)
            .with("appid", 10)
            .with("name", "Portal"),
    ]);

    let owned = Join::new(
        Table::<OwnedGames, _>::new(conn.clone()),
        Table::<Games, _>::new(conn.clone()),
        OwnedCol::AppId,
        GameCol::AppId,
    );
    let rows = owned
        .select(
            Filter::new()
                .eq(JoinColumn::<OwnedGames, Games>::primary(OwnedCol::SteamId), "1")
                .gt(JoinColumn::primary(OwnedCol::Playtime), 60),
            QueryOptions::new().desc(JoinColumn::secondary(GameCol::Name)),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 4);
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Portal".into())));

    let executed = conn.last();
    assert_eq!(executed.sql.matches("LEFT JOIN").count(), 1);
    assert_eq!(
        executed.sql,
        "SELECT owned_games.*, games.* FROM owned_games \
         LEFT JOIN games ON owned_games.appid = games.appid \
         WHERE owned_games.steam_id = ? AND owned_games.playtime > ? \
         ORDER BY games.name DESC"
    );
    assert_eq!(
        executed.params,
        vec![Value::Text("1".into()), Value::Integer(60)]
    );
}

#[tokio::test]
async fn lazy_connection_failure_surfaces_as_uninitialized() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let conn = Arc::new(LazyConnection::<Recorder>::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err(Error::storage("database unavailable")) }
    }));

    let table: Table<Players, _> = Table::new(conn.clone());
    let err = table
        .select(Predicate::all(), QueryOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_uninitialized());

    let err = table.delete(Predicate::all()).await.unwrap_err();
    assert!(err.is_uninitialized());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn lazy_connection_is_shared_across_accessors() {
    let recorder = Recorder::new();
    let inner = recorder.clone();
    let conn = Arc::new(LazyConnection::new(move || {
        let inner = inner.clone();
        async move { Ok(inner) }
    }));

    let players: Table<Players, _> = Table::new(conn.clone());
    let games: Table<Games, _> = Table::new(conn.clone());
    players.count(Predicate::all(), QueryOptions::new()).await.unwrap();
    games
        .delete(Filter::new().eq(GameCol::AppId, 1))
        .await
        .unwrap();

    assert!(conn.is_initialized());
    assert_eq!(recorder.executed().len(), 2);
}

#[tokio::test]
async fn compile_errors_never_touch_a_lazy_connection() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let conn = LazyConnection::<Recorder>::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(Recorder::new()) }
    });

    let table: Table<Players, _> = Table::new(&conn);
    let err = table
        .update(Mutation::new(), Predicate::all())
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}
