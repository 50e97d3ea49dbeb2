//! integrisync - file integrity checker and chunked mirror
//!
//! Entry point for the integrisync CLI application.

use clap::Parser;
use integrisync::{
    actions::TransferError,
    cli::Cli,
    error::{ExitCode, StructuredError},
    jobs::JobError,
};

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let interrupted = err
        .downcast_ref::<JobError>()
        .is_some_and(|e| matches!(e, JobError::Interrupted))
        || err
            .downcast_ref::<TransferError>()
            .is_some_and(|e| matches!(e, TransferError::Interrupted));
    if interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match integrisync::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = exit_code_for(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
