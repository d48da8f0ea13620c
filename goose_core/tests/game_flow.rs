use goose_core::{GameError, GameEvent, GamePhase, GooseGame};

/// Walks alice to the inn at cell 19 through normal cells only, while bob
/// shuffles along the low track.
fn walk_alice_to_the_inn(game: &mut GooseGame) {
    // alice: 0 -> 4 -> 10 -> 16 -> 19; bob: 0 -> 1 -> 2 -> 3.
    for (alice_dice, last) in [(4u8, false), (6, false), (6, false), (3, true)] {
        game.move_player(1, alice_dice).expect("alice roll");
        game.next_turn();
        if !last {
            game.move_player(2, 1).expect("bob roll");
            game.next_turn();
        }
    }
}

#[test]
fn inn_visit_costs_a_round_end_to_end() {
    let mut game = GooseGame::new();
    game.start_multiplayer(["alice", "bob"]);

    walk_alice_to_the_inn(&mut game);
    assert_eq!(game.players()[0].position, 19);
    assert_eq!(game.players()[0].turns_to_skip, 1);

    // bob's round; passing alice consumes her skip.
    game.move_player(2, 1).expect("bob roll");
    let events = game.next_turn();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::TurnSkipped { player_id: 1, .. })));
    assert_eq!(game.current_player_id(), Some(2));

    // 4 + 3 = 7 is an arrow marker, gameplay-neutral.
    game.move_player(2, 3).expect("bob roll");
    game.next_turn();
    assert_eq!(game.current_player_id(), Some(1));
}

#[test]
fn bot_game_alternates_turns() {
    let mut game = GooseGame::new();
    game.start_bot_game("alice");
    assert!(game.is_bot_mode());
    assert_eq!(game.current_player_id(), Some(1));

    game.move_player(1, 3).expect("human roll"); // 0 + 3, normal
    let events = game.next_turn();
    assert!(events.iter().any(|e| matches!(e, GameEvent::BotTurnDue)));
    assert!(game.current_player_is_bot());

    let events = game.bot_move(2).expect("bot roll"); // 0 + 2, normal
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::Moved { player_id: 2, .. })));
    assert_eq!(game.current_player_id(), Some(1));
}

#[test]
fn bot_goose_landing_requests_another_bot_roll() {
    let mut game = GooseGame::new();
    game.start_bot_game("alice");
    game.move_player(1, 1).expect("human roll");
    game.next_turn();

    // Bot rolls 5: goose cell 5 jumps to 9 and the bot keeps the turn.
    let events = game.bot_move(5).expect("bot roll");
    assert!(events.iter().any(|e| matches!(e, GameEvent::BotTurnDue)));
    assert!(game.current_player_is_bot());
    assert_eq!(game.players()[1].position, 9);

    // The repeat sentinel was cleared inside bot_move's turn advance, so
    // the follow-up roll is a plain move.
    game.bot_move(1).expect("bot roll again");
    assert_eq!(game.current_player_id(), Some(1));
}

#[test]
fn bot_move_rejected_when_human_to_play() {
    let mut game = GooseGame::new();
    game.start_bot_game("alice");
    assert_eq!(game.bot_move(4), Err(GameError::NotABot));
}

#[test]
fn rematch_resets_a_finished_bot_game() {
    let mut game = GooseGame::new();
    game.start_bot_game("alice");
    game.move_player(1, 3).expect("human roll");
    game.declare_winner(2).expect("forfeit to bot");
    assert_eq!(game.phase(), GamePhase::Finished);

    let events = game.request_rematch(1).expect("rematch");
    assert!(matches!(events.first(), Some(GameEvent::RematchStarted)));
    assert_eq!(game.phase(), GamePhase::InProgress);
    assert!(game.players().iter().all(|p| p.position == 0));
    assert_eq!(game.current_player_id(), Some(1));
}
