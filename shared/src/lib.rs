use goose_core::{CellType, Player};
use serde::{Deserialize, Serialize};

/// Inbound frames. The envelope is a JSON object with a `type`
/// discriminator; payload fields are camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join the random-opponent matchmaking queue.
    PlayRandom,
    /// Leave the matchmaking queue.
    CancelSearch,
    /// Start a game against the built-in bot.
    PlayBot,
    /// Roll the dice in the given game. The server draws the value.
    #[serde(rename_all = "camelCase")]
    RollDice { game_id: String },
    #[serde(rename_all = "camelCase")]
    RequestRematch { game_id: String },
    /// The client-side turn timer expired; the turn is forfeited.
    #[serde(rename_all = "camelCase")]
    TurnTimeout { game_id: String },
    #[serde(rename_all = "camelCase")]
    AbandonGame { game_id: String },
}

/// Outbound frames, serialized once per broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    ActiveConnections {
        count: usize,
    },
    #[serde(rename_all = "camelCase")]
    WaitingStatus {
        players_in_queue: usize,
        total_players: usize,
    },
    #[serde(rename_all = "camelCase")]
    GameReady {
        game_id: String,
        opponent_id: String,
    },
    #[serde(rename_all = "camelCase")]
    MoveResult {
        player_id: i32,
        player_name: String,
        dice_result: u8,
        new_position: u8,
        cell_type: CellType,
        special_message: String,
    },
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        players: Vec<Player>,
        current_player: i32,
        dice_result: Option<u8>,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        winner_id: i32,
        winner_name: String,
    },
    #[serde(rename_all = "camelCase")]
    SkipTurn {
        player_id: i32,
        player_name: String,
        turns_to_skip: i32,
    },
    #[serde(rename_all = "camelCase")]
    FriendConnected {
        friend_id: String,
    },
    #[serde(rename_all = "camelCase")]
    FriendDisconnected {
        friend_id: String,
    },
    #[serde(rename_all = "camelCase")]
    RematchStarted {
        game_id: String,
    },
    #[serde(rename_all = "camelCase")]
    BotTurn {
        game_id: String,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_tags_are_camel_case() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"playRandom"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlayRandom));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"rollDice","gameId":"g1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RollDice { game_id } if game_id == "g1"));
    }

    #[test]
    fn outbound_envelope_has_type_discriminator() {
        let json = serde_json::to_string(&ServerMessage::ActiveConnections { count: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"activeConnections","count":3}"#);

        let json = serde_json::to_string(&ServerMessage::WaitingStatus {
            players_in_queue: 1,
            total_players: 7,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"waitingStatus","playersInQueue":1,"totalPlayers":7}"#
        );
    }

    #[test]
    fn move_result_serializes_cell_type_camel_case() {
        let json = serde_json::to_string(&ServerMessage::MoveResult {
            player_id: 1,
            player_name: "alice".into(),
            dice_result: 2,
            new_position: 63,
            cell_type: CellType::Goose,
            special_message: String::new(),
        })
        .unwrap();
        assert!(json.contains(r#""cellType":"goose""#));
        assert!(json.contains(r#""newPosition":63"#));
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"unknown"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
