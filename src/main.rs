//! imagesweep - Review and remove similar images
//!
//! Entry point for the imagesweep CLI application.

use clap::Parser;
use imagesweep::{
    cli::Cli,
    error::{ExitCode, SessionError, StructuredError},
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match imagesweep::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
                }
            } else if let Some(session_err) = err.downcast_ref::<SessionError>() {
                eprintln!(
                    "[{}] {}",
                    exit_code.code_prefix(),
                    session_err.user_message()
                );
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
