use cqrs_application::command::Command;
use cqrs_macros::command;

#[command]
struct ChangeEmailCommand {
    email: String,
}

#[command(name = "user.register")]
struct Register {
    email: String,
}

fn main() {
    assert_eq!(ChangeEmailCommand::NAME, "ChangeEmail");
    assert_eq!(Register::NAME, "user.register");

    let cmd = ChangeEmailCommand {
        email: "a@example.com".into(),
    };
    assert_eq!(format!("{cmd:?}"), "ChangeEmailCommand { email: \"a@example.com\" }");
    let _ = Register { email: cmd.email };
}
