use super::*;
use commonware_codec::{Encode, EncodeSize, Error, ReadExt};
use rand::{rngs::StdRng, RngCore, SeedableRng};

fn sample_player() -> PlayerSession {
    PlayerSession::from_contract(true, false, 3, 13, U256::from(0xdead_beef_u64) << 200usize)
}

#[test]
fn test_symbol_from_code_masks_to_two_bits() {
    assert_eq!(Symbol::from_code(0), Symbol::None);
    assert_eq!(Symbol::from_code(1), Symbol::Chog);
    assert_eq!(Symbol::from_code(2), Symbol::Moyaki);
    assert_eq!(Symbol::from_code(3), Symbol::Molandak);
    assert_eq!(Symbol::from_code(0b101), Symbol::Chog);
    for symbol in Symbol::ALL {
        assert_eq!(Symbol::from_code(symbol.code()), symbol);
    }
}

#[test]
fn test_card_visible_skips_empty_slots() {
    let card = Card::from_codes([1, 0, 3, 0]);
    let visible: Vec<_> = card.visible().collect();
    assert_eq!(visible, vec![Symbol::Chog, Symbol::Molandak]);
    assert_eq!(card.count(Symbol::None), 2);
    assert!(!card.is_blank());
    assert!(Card::default().is_blank());
}

#[test]
fn test_batch_indexes_follow_start() {
    let batch = CardBatch::new(
        4,
        [
            Card::from_codes([1, 2, 3, 0]),
            Card::from_codes([1, 1, 1, 1]),
            Card::from_codes([2, 2, 3, 3]),
        ],
    );
    let indexes: Vec<_> = batch.indexed().map(|(idx, _)| idx).collect();
    assert_eq!(indexes, vec![4, 5, 6]);
    assert_eq!(batch.tally(), [1, 5, 3, 3]);
    assert_eq!(
        batch.to_string(),
        "#4[chog,moyaki,molandak,-] #5[chog,chog,chog,chog] #6[moyaki,moyaki,molandak,molandak]"
    );
}

#[test]
fn test_stage_from_raw_ignores_unknown_values() {
    assert_eq!(Stage::from_raw(0), Some(Stage::NotStart));
    assert_eq!(Stage::from_raw(1), Some(Stage::Playing));
    assert_eq!(Stage::from_raw(2), Some(Stage::Ended));
    assert_eq!(Stage::from_raw(3), None);
    assert_eq!(Stage::from_raw(u8::MAX), None);
}

#[test]
fn test_stage_roundtrip() {
    for stage in [Stage::NotStart, Stage::Playing, Stage::Ended] {
        let encoded = stage.encode();
        let decoded = Stage::read(&mut &encoded[..]).unwrap();
        assert_eq!(stage, decoded);
    }
    let err = Stage::read(&mut &[7u8][..]).expect_err("unknown stage must not decode");
    assert!(matches!(err, Error::InvalidEnum(7)));
}

#[test]
fn test_display_stage_controls() {
    assert!(DisplayStage::Playing.accepts_actions());
    assert!(!DisplayStage::WaitingEnd.accepts_actions());
    assert!(!DisplayStage::NotStart.accepts_actions());
    assert_eq!(DisplayStage::from(Stage::Ended), DisplayStage::Ended);
    assert_eq!(DisplayStage::WaitingEnd.to_string(), "WAITING_END");
}

#[test]
fn test_player_from_contract_derives_turn() {
    let player = sample_player();
    assert_eq!(player.turn, 1);
    player.validate_invariants().expect("valid invariants");
    assert!(player.has_seed());
    assert!(!PlayerSession::default().has_seed());
}

#[test]
fn test_player_validate_rejects_turn_out_of_range() {
    let mut player = sample_player();
    player.turn = RESEED_INTERVAL;
    assert!(matches!(
        player.validate_invariants(),
        Err(PlayerInvariantError::TurnOutOfRange { .. })
    ));
}

#[test]
fn test_player_validate_rejects_turn_mismatch() {
    let mut player = sample_player();
    player.turn = 4;
    assert_eq!(
        player.validate_invariants(),
        Err(PlayerInvariantError::TurnMismatch {
            turn: 4,
            action_count: 13
        })
    );
}

#[test]
fn test_player_roundtrip() {
    let player = sample_player();
    let encoded = player.encode();
    assert_eq!(encoded.len(), player.encode_size());
    let decoded = PlayerSession::read(&mut &encoded[..]).unwrap();
    assert_eq!(player, decoded);
}

#[test]
fn test_end_info_provisional() {
    let info = EndInfo::provisional(Address::repeat_byte(1), sample_player());
    assert!(info.is_provisional());
    let encoded = info.encode();
    let decoded = EndInfo::read(&mut &encoded[..]).unwrap();
    assert_eq!(info, decoded);
}

#[test]
fn test_event_concerns_address() {
    let me = Address::repeat_byte(1);
    let other = Address::repeat_byte(2);
    let started = Event::GameStarted {
        players: vec![other],
        seed: U256::one(),
    };
    assert!(started.concerns(&me));
    assert!(started.end_info().is_none());

    let ended = Event::GameEnded {
        address: other,
        player: sample_player(),
        end_time: 1_700_000_000,
    };
    assert!(!ended.concerns(&me));
    assert!(ended.concerns(&other));
    let info = ended.end_info().expect("end info");
    assert_eq!(info.address, other);
    assert!(!info.is_provisional());
}

#[test]
fn test_event_roundtrip() {
    let events = [
        Event::GameStarted {
            players: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            seed: U256::MAX,
        },
        Event::GameEnded {
            address: Address::repeat_byte(3),
            player: sample_player(),
            end_time: 42,
        },
    ];
    for event in events {
        let encoded = event.encode();
        assert_eq!(encoded.len(), event.encode_size());
        let decoded = Event::read(&mut &encoded[..]).unwrap();
        assert_eq!(event, decoded);
    }
}

#[test]
fn test_event_rejects_too_many_players() {
    let mut bytes = vec![0u8, (MAX_PLAYERS + 1) as u8];
    bytes.extend(std::iter::repeat(0u8).take((MAX_PLAYERS + 1) * 20 + SEED_BYTES));
    let err = Event::read(&mut bytes.as_slice()).expect_err("player list is bounded");
    assert!(matches!(err, Error::Invalid("Event", "too many players")));
}

#[test]
fn test_event_full_table_round_trips() {
    let event = Event::GameStarted {
        players: (0..MAX_PLAYERS as u8).map(Address::repeat_byte).collect(),
        seed: U256::from(9u64),
    };
    let encoded = event.encode();
    assert_eq!(encoded[1] as usize, MAX_PLAYERS);
    assert_eq!(Event::read(&mut &encoded[..]).unwrap(), event);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "too many players")]
fn test_event_encode_rejects_oversized_table() {
    let event = Event::GameStarted {
        players: (0..=MAX_PLAYERS as u8).map(Address::repeat_byte).collect(),
        seed: U256::from(9u64),
    };
    let _ = event.encode();
}

#[test]
fn test_event_handles_malformed_inputs() {
    let mut rng = StdRng::seed_from_u64(0x5eed_c0de);
    for _ in 0..500 {
        let len = (rng.next_u32() as usize) % 128;
        let mut buf = vec![0u8; len];
        rng.fill_bytes(&mut buf);
        let mut reader = buf.as_slice();
        if let Ok(Event::GameStarted { players, .. }) = Event::read(&mut reader) {
            assert!(players.len() <= MAX_PLAYERS);
        }
    }
}

#[test]
fn test_game_config_validation() {
    let valid = GameConfig::new(24, 24);
    assert!(valid.validate().is_ok());
    assert_eq!(GameConfig::default(), valid);

    assert_eq!(
        GameConfig::new(0, 0).validate(),
        Err(ConfigError::ZeroMaxAction)
    );
    assert_eq!(
        GameConfig::new(24, 0).validate(),
        Err(ConfigError::ZeroMaxActionPerRound)
    );
    assert_eq!(
        GameConfig::new(12, 24).validate(),
        Err(ConfigError::RoundExceedsGame {
            per_round: 24,
            max: 12
        })
    );
}

#[test]
fn test_chain_state_keeps_raw_stage() {
    let state = ChainState {
        stage_raw: 9,
        player: PlayerSession::default(),
    };
    assert_eq!(state.stage(), None);
    assert_eq!(
        ChainState::new(Stage::Playing, PlayerSession::default()).stage(),
        Some(Stage::Playing)
    );
}

#[test]
fn test_contract_error_names() {
    for err in ContractError::ALL {
        assert_eq!(ContractError::from_abi_name(err.abi_name()), Some(err));
    }
    assert_eq!(ContractError::from_abi_name("ErrorUnknown"), None);
    assert_eq!(
        ContractError::OutPlayer.to_string(),
        "ErrorOutPlayer (player is out)"
    );
}

#[test]
fn test_player_serde_json() {
    let player = sample_player();
    let json = serde_json::to_string(&player).unwrap();
    let decoded: PlayerSession = serde_json::from_str(&json).unwrap();
    assert_eq!(player, decoded);
}
