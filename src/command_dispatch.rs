//! Purpose: Hold top-level CLI command dispatch for `dstmerge`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Retrieval and merge finish before any output is written.
//! Invariants: A failed command writes no output file.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dstmerge", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Letters { letters_dir } => {
            let letters_dir = letters_dir.unwrap_or_else(default_letters_dir);
            emit_json(letters_table_json(&letters_dir));
            Ok(RunOutcome::ok())
        }
        Command::Merge {
            word,
            source,
            out,
            force,
        } => {
            init_tracing("warn");
            let source = source.into_source()?;
            let runtime = build_runtime()?;
            let composed = runtime.block_on(compose_word(&word, source))?;
            emit_notices(&composed, "merge", color_mode);

            match resolve_output_target(out, &composed.file_name) {
                OutputTarget::Stdout => write_stdout(&composed.bytes)?,
                OutputTarget::File(path) => {
                    write_output(&path, &composed.bytes, force)?;
                    emit_json(merge_summary_json(&composed, Some(path.as_path())));
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Serve {
            bind,
            source,
            allow_non_loopback,
        } => {
            init_tracing("info");
            let bind: std::net::SocketAddr = bind.parse().map_err(|_| {
                Error::new(ErrorKind::InvalidInput)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:9710.")
            })?;
            let config = serve::ServeConfig {
                bind,
                source: source.into_source()?,
                allow_non_loopback,
            };
            let runtime = build_runtime()?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}
