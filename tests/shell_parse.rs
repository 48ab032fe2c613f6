use img_relocate::shell::{ShellCommand, parse_command};

#[test]
fn move_and_plan_take_all_or_numbers() {
    assert_eq!(parse_command("move all"), Ok(ShellCommand::MoveAll));
    assert_eq!(parse_command("  MOVE 1 3,5 "), Ok(ShellCommand::MoveSelected(vec![0, 2, 4])));
    assert_eq!(parse_command("plan all"), Ok(ShellCommand::PlanAll));
    assert_eq!(parse_command("plan 2"), Ok(ShellCommand::PlanSelected(vec![1])));
}

#[test]
fn bad_numbers_are_rejected() {
    assert!(parse_command("move").is_err());
    assert!(parse_command("move 0").is_err());
    assert!(parse_command("move two").is_err());
}

#[test]
fn simple_commands() {
    assert_eq!(parse_command(""), Ok(ShellCommand::Empty));
    assert_eq!(parse_command("ls"), Ok(ShellCommand::Preview));
    assert_eq!(parse_command("recursive off"), Ok(ShellCommand::Recursive(false)));
    assert!(parse_command("recursive").is_err());
    assert_eq!(parse_command("undo"), Ok(ShellCommand::Undo));
    assert_eq!(parse_command("exit"), Ok(ShellCommand::Quit));
    assert!(parse_command("rm -rf").is_err());
}
