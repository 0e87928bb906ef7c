//! CSV roster import: `name,seed,skill,team` with every column but `name` optional.

use crate::models::{BracketError, Participant, ParticipantId, Tournament};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    seed: Option<u32>,
    #[serde(default)]
    skill: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    team: Option<bool>,
}

impl From<RosterRow> for Participant {
    fn from(row: RosterRow) -> Self {
        let mut participant = if row.team.unwrap_or(false) {
            Participant::team(row.name)
        } else {
            Participant::new(row.name)
        };
        participant.seed_number = row.seed;
        participant.skill = row.skill;
        participant
    }
}

/// Parse a roster. Rows are returned in file order (their registration order).
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<Participant>, BracketError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    rdr.deserialize::<RosterRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map(Participant::from)
                .map_err(|e| BracketError::Roster(format!("row {}: {}", i + 1, e)))
        })
        .collect()
}

/// Register every roster row, or none of them: a rejected row rolls the roster back.
pub fn import_roster<R: Read>(
    tournament: &mut Tournament,
    reader: R,
) -> Result<Vec<ParticipantId>, BracketError> {
    let participants = read_roster(reader)?;
    let registered = tournament.participants.len();
    let mut added = Vec::with_capacity(participants.len());
    for (row, participant) in participants.into_iter().enumerate() {
        match tournament.register(participant) {
            Ok(id) => added.push(id),
            Err(e) => {
                tournament.participants.truncate(registered);
                log::warn!("Roster import rejected at row {}: {}", row + 1, e);
                return Err(e);
            }
        }
    }
    log::info!("Imported {} participants into tournament {}", added.len(), tournament.id);
    Ok(added)
}
