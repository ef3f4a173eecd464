#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rowsmith::{
    Column, Connection, Entity, FromRecord, IntoRecord, Placeholder, Record, Result, RunResult,
    Value,
};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Statement as the connection saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct State {
    executed: Mutex<Vec<Executed>>,
    responses: Mutex<VecDeque<Result<Vec<Record>>>>,
}

/// Connection double: records every statement and replays queued responses.
///
/// With no queued response, `all` yields no rows and `run` reports zero
/// changes.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Arc<State>,
    pub placeholder: Placeholder,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numbered() -> Self {
        Self {
            placeholder: Placeholder::Numbered,
            ..Self::default()
        }
    }

    pub fn respond(&self, rows: Vec<Record>) -> &Self {
        self.state.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn fail(&self, err: rowsmith::Error) -> &Self {
        self.state.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.executed.lock().unwrap().clone()
    }

    pub fn last(&self) -> Executed {
        self.executed().pop().expect("no statement executed")
    }

    fn next(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.state.executed.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.state
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl Connection for Recorder {
    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        let rows = self.next(sql, params)?;
        Ok(RunResult {
            changes: rows.len() as u64,
        })
    }

    async fn all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.next(sql, params)
    }

    fn placeholder(&self) -> Placeholder {
        self.placeholder
    }
}

// ==================== Sample schema ====================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCol {
    SteamId,
    VanityUrl,
    Visits,
    LastUpdate,
}

impl Column for PlayerCol {
    fn name(&self) -> Cow<'static, str> {
        match self {
            PlayerCol::SteamId => "steam_id".into(),
            PlayerCol::VanityUrl => "vanity_url".into(),
            PlayerCol::Visits => "visits".into(),
            PlayerCol::LastUpdate => "last_update".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub steam_id: String,
    pub vanity_url: Option<String>,
    pub visits: i64,
    pub last_update: DateTime<Utc>,
}

impl FromRecord for Player {
    fn from_record(r: Record) -> Result<Self> {
        Ok(Self {
            steam_id: r.get_as("steam_id")?,
            vanity_url: r.get_as("vanity_url")?,
            visits: r.get_as("visits")?,
            last_update: r.get_as("last_update")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPlayer {
    pub steam_id: String,
    pub vanity_url: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl IntoRecord for NewPlayer {
    fn into_record(self) -> Record {
        let mut record = Record::new().with("steam_id", self.steam_id);
        if let Some(vanity) = self.vanity_url {
            record.insert("vanity_url", vanity);
        }
        if let Some(at) = self.last_update {
            record.insert("last_update", at);
        }
        record
    }
}

pub struct Players;

impl Entity for Players {
    const TABLE: &'static str = "players";
    type Column = PlayerCol;
    type Row = Player;
    type Insert = NewPlayer;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameCol {
    AppId,
    Name,
}

impl Column for GameCol {
    fn name(&self) -> Cow<'static, str> {
        match self {
            GameCol::AppId => "appid".into(),
            GameCol::Name => "name".into(),
        }
    }
}

pub struct Games;

impl Entity for Games {
    const TABLE: &'static str = "games";
    type Column = GameCol;
    type Row = Record;
    type Insert = Record;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OwnedCol {
    SteamId,
    AppId,
    Playtime,
}

impl Column for OwnedCol {
    fn name(&self) -> Cow<'static, str> {
        match self {
            OwnedCol::SteamId => "steam_id".into(),
            OwnedCol::AppId => "appid".into(),
            OwnedCol::Playtime => "playtime".into(),
        }
    }
}

pub struct OwnedGames;

impl Entity for OwnedGames {
    const TABLE: &'static str = "owned_games";
    type Column = OwnedCol;
    type Row = Record;
    type Insert = Record;
}

pub fn player_record(steam_id: &str, visits: i64, last_update: &str) -> Record {
    Record::new()
        .with("steam_id", steam_id)
        .with("vanity_url", Value::Null)
        .with("visits", visits)
        .with("last_update", last_update)
}
