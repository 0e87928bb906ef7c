//! Single binary web host for the bracket engine: REST API over in-memory tournaments.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, INACTIVITY_HOURS.

use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_engine::{
    clear_match_result, declare_winners, edit_match_result, generate_bracket, generate_tiebreaker,
    import_roster, load_bracket, next_swiss_round, record_match_result, save_bracket,
    set_match_winner, tournament_standings, winners, BracketConfig, BracketError, BracketRecord,
    Format, MatchId, MatchResult, MemorySink, Participant, ParticipantId, SeedingStrategy,
    ServerConfig, Tournament, TournamentId,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Per-tournament entry: tournament data + the prize pool used when saving winners.
struct TournamentEntry {
    tournament: Tournament,
    prize_pool: u64,
}

/// In-memory state: tournaments by id and the saved brackets (stand-in for the persistence API).
struct AppData {
    tournaments: RwLock<HashMap<TournamentId, TournamentEntry>>,
    saved: RwLock<MemorySink>,
}

type AppState = Data<AppData>;

/// How often idle tournaments are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    format: Format,
    #[serde(default)]
    config: BracketConfig,
    /// Minor currency units.
    #[serde(default)]
    prize_pool: u64,
}

fn default_name() -> String {
    "Tournament".to_string()
}

#[derive(Deserialize)]
struct AddParticipantBody {
    name: String,
    #[serde(default)]
    seed_number: Option<u32>,
    #[serde(default)]
    skill: Option<u32>,
    #[serde(default)]
    is_team: bool,
}

#[derive(Deserialize)]
struct SetFormatBody {
    format: Format,
}

#[derive(Deserialize)]
struct GenerateBody {
    #[serde(default)]
    strategy: SeedingStrategy,
}

#[derive(Deserialize)]
struct MatchResultBody {
    match_id: MatchId,
    result: MatchResult,
}

#[derive(Deserialize)]
struct SetMatchWinnerBody {
    match_id: MatchId,
    participant_id: ParticipantId,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and participant id
#[derive(Deserialize)]
struct TournamentParticipantPath {
    id: TournamentId,
    participant_id: ParticipantId,
}

/// Path segments: tournament id and match id
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

/// `GET /bracket?tournamentId=&format=`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BracketQuery {
    tournament_id: TournamentId,
    #[serde(default)]
    format: Option<Format>,
}

fn bad_request(e: BracketError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

fn no_tournament() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

/// Run `action` on one tournament under the write lock. Any access counts as activity.
fn with_tournament<F>(state: &AppState, id: TournamentId, action: F) -> HttpResponse
where
    F: FnOnce(&mut TournamentEntry) -> HttpResponse,
{
    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&id) {
        Some(entry) => {
            entry.tournament.touch();
            action(entry)
        }
        None => no_tournament(),
    }
}

/// Respond with the updated tournament, or the error as 400.
fn tournament_or_error<T>(t: &Tournament, result: Result<T, BracketError>) -> HttpResponse {
    match result {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => bad_request(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine",
    })
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Option<Json<CreateTournamentBody>>) -> HttpResponse {
    let (tournament, prize_pool) = match body {
        Some(b) => {
            let b = b.into_inner();
            (Tournament::new(b.name, b.format, b.config), b.prize_pool)
        }
        None => (
            Tournament::new(default_name(), Format::default(), BracketConfig::default()),
            0,
        ),
    };
    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let response = HttpResponse::Ok().json(&tournament);
    log::info!("Created tournament {} ({:?})", tournament.id, tournament.format);
    g.insert(
        tournament.id,
        TournamentEntry {
            tournament,
            prize_pool,
        },
    );
    response
}

/// Get a tournament by id (404 if not found). Touching it refreshes its activity time.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| HttpResponse::Ok().json(&entry.tournament))
}

/// Change the format (Setup only).
#[put("/api/tournaments/{id}/format")]
async fn api_set_format(state: AppState, path: Path<TournamentPath>, body: Json<SetFormatBody>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = t.set_format(body.format);
        tournament_or_error(t, result)
    })
}

/// Replace bracket options (Setup only).
#[put("/api/tournaments/{id}/config")]
async fn api_set_config(state: AppState, path: Path<TournamentPath>, body: Json<BracketConfig>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = t.set_config(body.into_inner());
        tournament_or_error(t, result)
    })
}

/// Add a participant (tournament must be in Setup).
#[post("/api/tournaments/{id}/participants")]
async fn api_add_participant(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddParticipantBody>,
) -> HttpResponse {
    let body = body.into_inner();
    with_tournament(&state, path.id, |entry| {
        let mut participant = if body.is_team {
            Participant::team(body.name)
        } else {
            Participant::new(body.name)
        };
        participant.seed_number = body.seed_number;
        participant.skill = body.skill;
        let t = &mut entry.tournament;
        let result = t.register(participant);
        tournament_or_error(t, result)
    })
}

/// Import participants from a CSV body (`name,seed,skill,team`).
#[post("/api/tournaments/{id}/participants/csv")]
async fn api_import_roster(state: AppState, path: Path<TournamentPath>, body: web::Bytes) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = import_roster(t, body.as_ref());
        tournament_or_error(t, result)
    })
}

/// Remove a participant by id (tournament must be in Setup).
#[delete("/api/tournaments/{id}/participants/{participant_id}")]
async fn api_remove_participant(state: AppState, path: Path<TournamentParticipantPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = t.remove_participant(path.participant_id);
        tournament_or_error(t, result)
    })
}

/// Build and seed the bracket (Setup -> InProgress).
#[post("/api/tournaments/{id}/generate")]
async fn api_generate_bracket(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<GenerateBody>>,
) -> HttpResponse {
    let strategy = body.map(|b| b.strategy).unwrap_or_default();
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = generate_bracket(t, strategy);
        tournament_or_error(t, result)
    })
}

/// Record a result. A match that already has one is refused.
#[post("/api/tournaments/{id}/matches/result")]
async fn api_record_result(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<MatchResultBody>,
) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = record_match_result(t, body.match_id, body.result);
        tournament_or_error(t, result)
    })
}

/// Replace a recorded result.
#[put("/api/tournaments/{id}/matches/result")]
async fn api_edit_result(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<MatchResultBody>,
) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = edit_match_result(t, body.match_id, body.result);
        tournament_or_error(t, result)
    })
}

/// Set winner for one match by participant id.
#[put("/api/tournaments/{id}/matches/winner")]
async fn api_set_match_winner(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<SetMatchWinnerBody>,
) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = set_match_winner(t, body.match_id, body.participant_id);
        tournament_or_error(t, result)
    })
}

/// Undo a result and everything that followed from it.
#[delete("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_clear_result(state: AppState, path: Path<TournamentMatchPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = clear_match_result(t, path.match_id);
        tournament_or_error(t, result)
    })
}

/// Pair the next swiss round.
#[post("/api/tournaments/{id}/swiss/next-round")]
async fn api_next_swiss_round(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        match next_swiss_round(&mut entry.tournament) {
            Ok(round) => HttpResponse::Ok().json(round),
            Err(e) => bad_request(e),
        }
    })
}

/// Generate the tiebreaker for the first open round robin tie (`null` if none is needed).
#[post("/api/tournaments/{id}/tiebreaker")]
async fn api_generate_tiebreaker(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        match generate_tiebreaker(&mut entry.tournament) {
            Ok(stage) => HttpResponse::Ok().json(stage),
            Err(e) => bad_request(e),
        }
    })
}

/// Declare the podium (InProgress -> Completed).
#[post("/api/tournaments/{id}/winners")]
async fn api_declare_winners(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        match declare_winners(&mut entry.tournament) {
            Ok(placements) => HttpResponse::Ok().json(placements),
            Err(e) => bad_request(e),
        }
    })
}

/// Prize records for a completed tournament.
#[get("/api/tournaments/{id}/winners")]
async fn api_winners(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        match winners(&entry.tournament, entry.prize_pool) {
            Ok(records) => HttpResponse::Ok().json(records),
            Err(e) => bad_request(e),
        }
    })
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        HttpResponse::Ok().json(tournament_standings(&entry.tournament))
    })
}

/// Restart tournament: back to Setup with the same participants.
#[post("/api/tournaments/{id}/restart")]
async fn api_restart_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = t.restart_tournament();
        tournament_or_error(t, result)
    })
}

/// Save the bracket (the `POST /bracket` payload) into the saved-bracket store.
#[post("/api/tournaments/{id}/save")]
async fn api_save_bracket(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut sink = match state.saved.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    with_tournament(&state, path.id, |entry| {
        match save_bracket(&entry.tournament, &mut *sink, entry.prize_pool) {
            Ok(record) => HttpResponse::Ok().json(record),
            Err(e) => bad_request(e),
        }
    })
}

/// Rebuild the bracket from a record in the body, or from the last saved one.
#[post("/api/tournaments/{id}/load")]
async fn api_load_bracket(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<BracketRecord>>,
) -> HttpResponse {
    let record = match body {
        Some(b) => b.into_inner(),
        None => {
            let sink = match state.saved.read() {
                Ok(guard) => guard,
                Err(_) => return HttpResponse::InternalServerError().body("lock error"),
            };
            match sink.saved.get(&path.id) {
                Some(record) => record.clone(),
                None => {
                    return HttpResponse::NotFound()
                        .json(serde_json::json!({ "error": "No saved bracket" }))
                }
            }
        }
    };
    with_tournament(&state, path.id, |entry| {
        let t = &mut entry.tournament;
        let result = load_bracket(t, &record);
        tournament_or_error(t, result)
    })
}

/// Saved bracket in the persistence API's shape.
#[get("/bracket")]
async fn api_get_bracket(state: AppState, query: Query<BracketQuery>) -> HttpResponse {
    if let Some(format) = query.format {
        let g = match state.tournaments.read() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        if let Some(entry) = g.get(&query.tournament_id) {
            if entry.tournament.format != format {
                return bad_request(BracketError::InvalidState);
            }
        }
    }
    let sink = match state.saved.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match sink.saved.get(&query.tournament_id) {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No saved bracket" })),
    }
}

fn app_state() -> AppState {
    Data::new(AppData {
        tournaments: RwLock::new(HashMap::new()),
        saved: RwLock::new(MemorySink::default()),
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_set_format)
        .service(api_set_config)
        .service(api_import_roster)
        .service(api_add_participant)
        .service(api_remove_participant)
        .service(api_generate_bracket)
        .service(api_record_result)
        .service(api_edit_result)
        .service(api_set_match_winner)
        .service(api_clear_result)
        .service(api_next_swiss_round)
        .service(api_generate_tiebreaker)
        .service(api_declare_winners)
        .service(api_winners)
        .service(api_standings)
        .service(api_restart_tournament)
        .service(api_save_bracket)
        .service(api_load_bracket)
        .service(api_get_bracket);
}

/// Drop tournaments idle for longer than `inactivity_hours`.
fn remove_idle(state: &AppState, inactivity_hours: i64) -> usize {
    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return 0,
    };
    let cutoff = Utc::now() - chrono::Duration::hours(inactivity_hours);
    let before = g.len();
    g.retain(|_, entry| entry.tournament.updated_at > cutoff);
    before - g.len()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = app_state();

    // Background task: every 30 minutes, remove tournaments idle past the configured timeout
    let state_cleanup = state.clone();
    let inactivity_hours = config.inactivity_hours;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = remove_idle(&state_cleanup, inactivity_hours);
            if removed > 0 {
                log::info!(
                    "Cleaned up {} inactive tournament(s) (no activity for {}h)",
                    removed,
                    inactivity_hours
                );
            }
        }
    });

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
