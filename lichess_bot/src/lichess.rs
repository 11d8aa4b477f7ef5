/// Lichess HTTP client implementing the server boundary
use std::time::Duration;

use async_trait::async_trait;
use futures::{future, StreamExt};
use lichess_arena::network::events::decode_line;
use lichess_arena::{
    Account, BotError, CandidateOpponent, ChallengeRequest, DeclineReason, EventStream, GameEvent,
    GameId, IncomingEvent, Result, ServerBoundary,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

/// Limit for one-shot calls; event streams stay open indefinitely
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer-authenticated client for the Lichess bot API
pub struct LichessClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LichessClient {
    pub fn with_base_url(token: String, base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lichess_bot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(boundary_error)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<()> {
        self.http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .form(form)
            .send()
            .await
            .map_err(boundary_error)?
            .error_for_status()
            .map_err(boundary_error)?;
        Ok(())
    }

    async fn open_stream<T>(&self, path: &str) -> Result<EventStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self
            .get(path)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BotError::Stream(e.to_string()))?;
        let body = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));
        Ok(ndjson_records(StreamReader::new(body)))
    }
}

fn boundary_error(e: reqwest::Error) -> BotError {
    BotError::Boundary(e.to_string())
}

/// Decode an NDJSON byte stream line by line
///
/// Keep-alive blank lines are dropped and an undecodable record becomes an
/// item error. A final line without newline is still delivered. Invalid
/// UTF-8 or a read failure ends the stream with a `Stream` error.
fn ndjson_records<R, T>(reader: R) -> EventStream<T>
where
    R: AsyncRead + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    FramedRead::new(reader, LinesCodec::new())
        .filter_map(|line| {
            future::ready(match line {
                Ok(line) => decode_line::<T>(&line).transpose(),
                Err(e) => Some(Err(BotError::Stream(e.to_string()))),
            })
        })
        .boxed()
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    username: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnlineUserRecord {
    id: String,
    username: Option<String>,
    #[serde(default)]
    perfs: PerfsRecord,
}

#[derive(Debug, Default, Deserialize)]
struct PerfsRecord {
    blitz: Option<PerfRecord>,
}

#[derive(Debug, Deserialize)]
struct PerfRecord {
    rating: Option<u32>,
}

impl From<OnlineUserRecord> for CandidateOpponent {
    fn from(record: OnlineUserRecord) -> Self {
        CandidateOpponent {
            username: record.username.unwrap_or_else(|| record.id.clone()),
            id: record.id,
            rating: record.perfs.blitz.and_then(|perf| perf.rating),
        }
    }
}

/// Parse the NDJSON body of the online bots directory
fn parse_online_bots(body: &str) -> Vec<CandidateOpponent> {
    body.lines()
        .filter_map(|line| match decode_line::<OnlineUserRecord>(line) {
            Ok(record) => record.map(CandidateOpponent::from),
            Err(e) => {
                tracing::debug!("Skipping directory entry: {}", e);
                None
            }
        })
        .collect()
}

/// Form fields of an outgoing challenge
fn challenge_form(request: &ChallengeRequest) -> Vec<(&'static str, String)> {
    vec![
        ("rated", request.rated.to_string()),
        ("clock.limit", request.clock_limit_secs.to_string()),
        ("clock.increment", request.clock_increment_secs.to_string()),
        ("variant", request.variant.key().to_string()),
    ]
}

#[async_trait]
impl ServerBoundary for LichessClient {
    async fn account(&self) -> Result<Account> {
        let response = self
            .http
            .get(self.url("/api/account"))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| BotError::Authentication(e.to_string()))?
            .error_for_status()
            .map_err(|e| BotError::Authentication(e.to_string()))?;
        let record: AccountRecord = response
            .json()
            .await
            .map_err(|e| BotError::Authentication(e.to_string()))?;
        Ok(Account {
            username: record.username,
            title: record.title,
        })
    }

    async fn stream_events(&self) -> Result<EventStream<IncomingEvent>> {
        self.open_stream("/api/stream/event").await
    }

    async fn stream_game(&self, game_id: &GameId) -> Result<EventStream<GameEvent>> {
        self.open_stream(&format!("/api/bot/game/stream/{}", game_id))
            .await
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<()> {
        self.post_form(&format!("/api/challenge/{}/accept", challenge_id), &[])
            .await
    }

    async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason) -> Result<()> {
        self.post_form(
            &format!("/api/challenge/{}/decline", challenge_id),
            &[("reason", reason.as_str().to_string())],
        )
        .await
    }

    async fn make_move(&self, game_id: &GameId, uci: &str) -> Result<()> {
        self.post_form(&format!("/api/bot/game/{}/move/{}", game_id, uci), &[])
            .await
    }

    async fn resign_game(&self, game_id: &GameId) -> Result<()> {
        self.post_form(&format!("/api/bot/game/{}/resign", game_id), &[])
            .await
    }

    async fn create_challenge(&self, request: &ChallengeRequest) -> Result<()> {
        self.post_form(
            &format!("/api/challenge/{}", request.username),
            &challenge_form(request),
        )
        .await
    }

    async fn list_online_opponents(&self) -> Result<Vec<CandidateOpponent>> {
        let body = self
            .get("/api/bot/online")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(boundary_error)?
            .text()
            .await
            .map_err(boundary_error)?;
        Ok(parse_online_bots(&body))
    }
}
