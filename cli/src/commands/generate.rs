use maptoposter_core::api::{
    encode, new_job_id, AppConfig, CliError, JobEvent, EVENT_CHANNEL_CAPACITY,
};
use maptoposter_plugins::build_bridge;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client;
use crate::commands::cli::GenerateArgs;

pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

/// Run one job and print its events. Returns the process exit code.
pub async fn handle_generate(args: GenerateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let request = args.to_request()?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            ctrl_c.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let worker = match args.server.clone() {
        Some(server) => tokio::spawn(client::stream_job(server, request, tx, cancel.clone())),
        None => {
            let bridge = build_bridge(cfg).map_err(|e| CliError::Command(format!("{e:#}")))?;
            let token = cancel.clone();
            tokio::spawn(async move {
                bridge.run(new_job_id(), request, tx, token).await;
                Ok::<(), anyhow::Error>(())
            })
        }
    };

    let mut terminal = None;
    while let Some(event) = rx.recv().await {
        print_event(&event, args.raw);
        if event.is_terminal() {
            terminal = Some(event);
        }
    }

    match worker.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("Error: {e:#}");
            return Ok(EXIT_FAILED);
        }
        Err(e) => return Err(CliError::Command(format!("job task failed: {e}"))),
    }

    Ok(exit_code(terminal.as_ref(), cancel.is_cancelled()))
}

fn exit_code(terminal: Option<&JobEvent>, cancelled: bool) -> i32 {
    match terminal {
        Some(JobEvent::Result(_)) => 0,
        Some(_) => EXIT_FAILED,
        None if cancelled => EXIT_CANCELLED,
        None => EXIT_FAILED,
    }
}

fn print_event(event: &JobEvent, raw: bool) {
    if raw {
        print!("{}", encode(event));
        return;
    }
    match event {
        JobEvent::Progress(p) => println!("[{:>3}%] {}", p.percent, p.label),
        JobEvent::Result(r) => {
            for file in &r.files {
                println!("Poster ready: {file}");
            }
        }
        JobEvent::Error(e) => {
            eprintln!("Error: {}", e.message);
            if let Some(detail) = &e.detail {
                eprintln!("{detail}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maptoposter_core::api::{ErrorEvent, ResultEvent};

    #[test]
    fn exit_codes() {
        let ok = JobEvent::Result(ResultEvent { files: vec![] });
        let err = JobEvent::Error(ErrorEvent {
            message: "boom".into(),
            detail: None,
        });
        assert_eq!(exit_code(Some(&ok), false), 0);
        assert_eq!(exit_code(Some(&err), false), EXIT_FAILED);
        assert_eq!(exit_code(None, true), EXIT_CANCELLED);
        assert_eq!(exit_code(None, false), EXIT_FAILED);
    }
}
