use super::*;

#[test]
fn parses_every_command() {
    let script = "\
# drag then click
down 10 20
move 30 40
up 30 40
down 5.5 6.5 secondary
wheel 100 100 -120
leave
color #0000EA
";
    let commands = parse_script(script).unwrap();
    assert_eq!(
        commands,
        vec![
            ReplayCommand::Pointer(PointerEvent::Down { at: Point::new(10.0, 20.0), button: Button::Primary }),
            ReplayCommand::Pointer(PointerEvent::Move { at: Point::new(30.0, 40.0) }),
            ReplayCommand::Pointer(PointerEvent::Up { at: Point::new(30.0, 40.0) }),
            ReplayCommand::Pointer(PointerEvent::Down { at: Point::new(5.5, 6.5), button: Button::Secondary }),
            ReplayCommand::Pointer(PointerEvent::Wheel {
                at: Point::new(100.0, 100.0),
                delta: WheelDelta { dx: 0.0, dy: -120.0 },
            }),
            ReplayCommand::Pointer(PointerEvent::Leave),
            ReplayCommand::Color("#0000EA".into()),
        ]
    );
}

#[test]
fn blank_and_comment_lines_are_skipped() {
    assert_eq!(parse_line(1, "   "), Ok(None));
    assert_eq!(parse_line(2, "  # note"), Ok(None));
}

#[test]
fn button_names_are_case_insensitive() {
    assert_eq!(
        parse_line(1, "down 1 1 MIDDLE"),
        Ok(Some(ReplayCommand::Pointer(PointerEvent::Down { at: Point::new(1.0, 1.0), button: Button::Middle })))
    );
}

#[test]
fn unknown_command_names_line() {
    assert_eq!(
        parse_script("move 1 1\njump 2 2"),
        Err(ReplayError::UnknownCommand { line: 2, command: "jump".into() })
    );
}

#[test]
fn wrong_arity_is_rejected() {
    assert!(matches!(parse_line(3, "move 1"), Err(ReplayError::Arity { line: 3, .. })));
    assert!(matches!(parse_line(3, "leave now"), Err(ReplayError::Arity { .. })));
    assert!(matches!(parse_line(3, "color"), Err(ReplayError::Arity { .. })));
}

#[test]
fn non_finite_numbers_are_rejected() {
    assert_eq!(
        parse_line(4, "up NaN 1"),
        Err(ReplayError::InvalidNumber { line: 4, value: "NaN".into() })
    );
    assert!(parse_line(4, "wheel 1 1 inf").is_err());
    assert!(parse_line(4, "move one 1").is_err());
}

#[test]
fn unknown_button_is_rejected() {
    assert_eq!(
        parse_line(5, "down 1 1 thumb"),
        Err(ReplayError::UnknownButton { line: 5, value: "thumb".into() })
    );
}

#[test]
fn missing_file_is_read_error() {
    assert!(matches!(
        read_script("/nonexistent/pixelboard/script.txt"),
        Err(ReplayError::Read { .. })
    ));
}
