//! Engine-level laws of fusion chess, exercised through the public surface
//! only: the capture-grants-movement scenarios, state-string round-trips,
//! undo as an exact inverse, and the composite terminal states.

use amalgamate::{FusionGame, MoveChannel, MoveFailure, Rejection};
use shakmaty::{Color, Role, Square};

fn must(game: &mut FusionGame, from: Square, to: Square) -> amalgamate::MoveOutcome {
    match game.move_piece(from, to) {
        Ok(outcome) => outcome,
        Err(e) => panic!("{from}{to} should be playable: {e}"),
    }
}

#[test]
fn knight_eats_bishop_then_moves_like_one() {
    // a black bishop parked on c3, in reach of the b1 knight
    let mut game =
        FusionGame::from_export("rn1qkbnr/pppppppp/8/8/8/2b5/PPPPPPPP/RN1QKBNR w KQkq - 0 1 ")
            .unwrap();

    let capture = must(&mut game, Square::B1, Square::C3);
    assert_eq!(capture.channel, MoveChannel::Primary);
    assert_eq!(capture.capture, Some(Role::Bishop));
    assert_eq!(game.fusion_at(Square::C3), Some(Role::Bishop));

    must(&mut game, Square::A7, Square::A6);

    // c3 → e5 is a bishop diagonal no knight could take
    let slide = must(&mut game, Square::C3, Square::E5);
    assert_eq!(slide.channel, MoveChannel::Fused);
    assert!(slide.notation.ends_with('~'));

    // the entry migrated with the piece
    assert_eq!(game.fusion_at(Square::C3), None);
    assert_eq!(game.fusion_at(Square::E5), Some(Role::Bishop));
}

#[test]
fn queen_eats_pawn_and_gains_nothing() {
    let mut game = FusionGame::from_export("4k3/8/8/3p4/8/8/3Q4/4K3 w - - 0 1 ").unwrap();
    let capture = must(&mut game, Square::D2, Square::D5);
    assert_eq!(capture.capture, Some(Role::Pawn));
    assert_eq!(game.fusion_at(Square::D5), None);
    assert!(game.export().ends_with("1 "), "no fusion entries expected");
}

#[test]
fn same_shape_capture_is_flat() {
    let mut game = FusionGame::from_export("4k3/8/8/8/8/2n5/8/1N2K3 w - - 0 1 ").unwrap();
    must(&mut game, Square::B1, Square::C3);
    assert_eq!(game.fusion_at(Square::C3), None);
}

#[test]
fn king_eats_rook_then_slides_like_one() {
    let mut game = FusionGame::from_export("4k3/8/8/8/8/4r3/4K3/8 w - - 0 1 ").unwrap();

    let capture = must(&mut game, Square::E2, Square::E3);
    assert_eq!(capture.channel, MoveChannel::Primary);
    assert_eq!(game.royal_fusion(Color::White), Some(Role::Rook));

    must(&mut game, Square::E8, Square::D8);

    // e3 → e6 is three squares of rook slide, no king step
    let slide = must(&mut game, Square::E3, Square::E6);
    assert_eq!(slide.channel, MoveChannel::Royal);
    assert_eq!(game.turn(), Color::Black);
    assert!(game.fen().starts_with("3k4/8/4K3/"));
}

#[test]
fn royal_grant_shows_up_in_the_move_list() {
    let mut game = FusionGame::from_export("4k3/8/8/8/8/4r3/4K3/8 w - - 0 1 ").unwrap();
    must(&mut game, Square::E2, Square::E3);
    must(&mut game, Square::E8, Square::D8);

    let fused = game.fused_moves(Square::E3).unwrap();
    assert!(!fused.is_empty());
    assert!(fused.iter().all(|c| c.channel == MoveChannel::Royal));
    assert!(fused.iter().any(|c| c.to == Square::E6));
}

#[test]
fn rook_bishop_cross_capture_promotes_in_place() {
    let mut game = FusionGame::from_export("4k3/8/8/8/8/b7/8/R3K3 w - - 0 1 ").unwrap();
    let capture = must(&mut game, Square::A1, Square::A3);
    assert_eq!(capture.capture, Some(Role::Bishop));
    // no secondary recorded; the rook itself is a queen now
    assert_eq!(game.fusion_at(Square::A3), None);
    assert!(game.fen().starts_with("4k3/8/8/8/8/Q7/8/4K3 b"));
}

#[test]
fn secondary_union_of_rook_and_bishop_is_a_queen() {
    let mut game = FusionGame::from_export("4k3/8/8/4r3/8/2b5/8/1N2K3 w - - 0 1 ").unwrap();
    must(&mut game, Square::B1, Square::C3); // knight gains the bishop
    must(&mut game, Square::E5, Square::A5); // rook wanders into the diagonal
    let capture = must(&mut game, Square::C3, Square::A5); // taken with the fused shape
    assert_eq!(capture.channel, MoveChannel::Fused);
    assert_eq!(capture.capture, Some(Role::Rook));
    assert_eq!(game.fusion_at(Square::A5), Some(Role::Queen));
}

#[test]
fn a_royal_queen_grant_is_final() {
    let mut game =
        FusionGame::from_export("4k3/8/8/8/8/4r3/4K3/8 w - - 0 1 wK=q,").unwrap();
    must(&mut game, Square::E2, Square::E3);
    assert_eq!(game.royal_fusion(Color::White), Some(Role::Queen));
}

#[test]
fn export_import_round_trip_preserves_the_move_set() {
    let original =
        FusionGame::from_export("4k3/8/8/8/2N5/8/8/4K3 w - - 0 1 c4b,wK=r,").unwrap();
    let reimported = FusionGame::from_export(&original.export()).unwrap();

    assert_eq!(original.export(), reimported.export());
    assert_eq!(
        original.legal_moves(None).unwrap(),
        reimported.legal_moves(None).unwrap()
    );
}

#[test]
fn round_trip_after_real_play() {
    let mut game =
        FusionGame::from_export("rn1qkbnr/pppppppp/8/8/8/2b5/PPPPPPPP/RN1QKBNR w KQkq - 0 1 ")
            .unwrap();
    must(&mut game, Square::B1, Square::C3);
    must(&mut game, Square::A7, Square::A6);
    must(&mut game, Square::C3, Square::E5);

    let reimported = FusionGame::from_export(&game.export()).unwrap();
    assert_eq!(game.export(), reimported.export());
    assert_eq!(reimported.fusion_at(Square::E5), Some(Role::Bishop));
}

#[test]
fn undo_walks_all_the_way_back_to_the_start() {
    let mut game = FusionGame::new();
    let start = game.export();

    must(&mut game, Square::E2, Square::E4);
    must(&mut game, Square::E7, Square::E5);
    must(&mut game, Square::G1, Square::F3);
    assert_eq!(game.history().len(), 3);

    assert!(game.undo().unwrap().is_some());
    assert!(game.undo().unwrap().is_some());
    assert!(game.undo().unwrap().is_some());

    assert_eq!(game.export(), start);
    assert_eq!(game.history().len(), 0);

    // one more undo on an empty log is a reset, not an error
    assert!(game.undo().unwrap().is_none());
    assert_eq!(game.export(), start);
}

#[test]
fn undo_restores_fusion_tables_too() {
    let mut game = FusionGame::from_export("4k3/8/8/8/8/4r3/4K3/8 w - - 0 1 ").unwrap();
    must(&mut game, Square::E2, Square::E3);
    assert_eq!(game.royal_fusion(Color::White), Some(Role::Rook));

    game.undo().unwrap();
    assert_eq!(game.royal_fusion(Color::White), None);
    assert_eq!(game.fen(), "4k3/8/8/8/8/4r3/4K3/8 w - - 0 1");
}

#[test]
fn rejections_do_not_disturb_the_state() {
    let mut game = FusionGame::new();
    let before = game.export();

    assert!(matches!(
        game.move_piece(Square::E5, Square::E6),
        Err(MoveFailure::Rejected(Rejection::EmptySquare))
    ));
    assert!(matches!(
        game.move_piece(Square::E7, Square::E5),
        Err(MoveFailure::Rejected(Rejection::OutOfTurn))
    ));
    assert!(matches!(
        game.move_piece(Square::E2, Square::E8),
        Err(MoveFailure::Rejected(Rejection::Unreachable))
    ));

    assert_eq!(game.export(), before);
    assert!(game.history().is_empty());
}

#[test]
fn a_shadow_pin_rejects_the_oracle_legal_move() {
    // the black knight on e6 carries a rook shape; moving the white knight
    // off the e-file is fine by the oracle but exposes the king on the
    // shadow board
    let mut game =
        FusionGame::from_export("6k1/8/4n3/8/4N3/8/8/4K3 w - - 0 1 e6r,").unwrap();
    assert!(matches!(
        game.move_piece(Square::E4, Square::C5),
        Err(MoveFailure::Rejected(Rejection::SelfCheck))
    ));
    // and the filtered move list agrees
    let moves = game.legal_moves(Some(Square::E4)).unwrap();
    assert!(!moves.iter().any(|c| c.to == Square::C5));
}

#[test]
fn a_fused_enemy_king_gives_check_at_a_distance() {
    // black's rook-granted king eyes the white king down the open file
    let game = FusionGame::from_export("4k3/8/8/8/8/8/8/4K3 w - - 0 1 bK=r,").unwrap();
    assert!(game.is_check().unwrap());

    let mut game = game;
    let escape = must(&mut game, Square::E1, Square::D1);
    assert_eq!(escape.channel, MoveChannel::Primary);
}

#[test]
fn fools_mate_is_still_mate() {
    let mut game = FusionGame::new();
    must(&mut game, Square::F2, Square::F3);
    must(&mut game, Square::E7, Square::E5);
    must(&mut game, Square::G2, Square::G4);
    must(&mut game, Square::D8, Square::H4);

    assert!(game.is_check().unwrap());
    assert!(game.is_checkmate().unwrap());
    assert!(game.is_game_over().unwrap());
    assert!(!game.is_stalemate().unwrap());
}

#[test]
fn bare_kings_draw_only_without_fusions() {
    let bare = FusionGame::from_export("4k3/8/8/8/8/8/8/4K3 w - - 0 1 ").unwrap();
    assert!(bare.is_draw().unwrap());

    // a rook-granted king is mating material
    let granted = FusionGame::from_export("4k3/8/8/8/8/8/8/4K3 w - - 0 1 wK=r,").unwrap();
    assert!(!granted.is_draw().unwrap());
}

#[test]
fn malformed_imports_name_their_reason() {
    use amalgamate::ImportError;

    // unreadable position
    assert!(matches!(
        FusionGame::from_export("gibberish everywhere "),
        Err(ImportError::Position(_))
    ));
    // unreadable entry list
    assert!(matches!(
        FusionGame::from_export("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 zz,"),
        Err(ImportError::Entries(_))
    ));
    // entry pointing at an empty square
    assert!(matches!(
        FusionGame::from_export("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 e5b,"),
        Err(ImportError::Mismatch { .. })
    ));
    // entry pointing at a king square
    assert!(matches!(
        FusionGame::from_export("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 e1b,"),
        Err(ImportError::Mismatch { .. })
    ));
}

#[test]
fn eviction_hook_only_fires_on_genuinely_stale_squares() {
    let mut game =
        FusionGame::from_export("4k3/8/8/8/2N5/8/8/4K3 w - - 0 1 c4b,").unwrap();
    // occupied fused square: nothing to evict
    assert!(!game.report_missing_fused_piece(Square::C4));
    // empty square without an entry: nothing to evict either
    assert!(!game.report_missing_fused_piece(Square::E5));
    assert_eq!(game.fusion_at(Square::C4), Some(Role::Bishop));
}

#[test]
fn snapshot_names_every_part_of_the_state() {
    let game = FusionGame::from_export("4k3/8/8/8/2N5/8/8/4K3 w - - 0 1 c4b,wK=r,").unwrap();
    let snap = game.snapshot();
    assert_eq!(snap.fen, "4k3/8/8/8/2N5/8/8/4K3 w - - 0 1");
    assert!(snap.virtual_fen.contains("2B5"), "shadow swaps the knight for a bishop");
    assert_eq!(snap.fused.len(), 1);
    assert_eq!(snap.fused[0].square, "c4");
    assert_eq!(snap.fused[0].piece, 'b');
    assert_eq!(snap.royal.len(), 1);
    assert_eq!(snap.royal[0].color, 'w');
    assert_eq!(snap.royal[0].piece, 'r');
}
