//! `streaming <access_key> <secret_key> <bucket> <key> <local_path>`
//!
//! Uploads `local_path` under `key`, always through the resumable
//! block/chunk engine. Progress is checkpointed to `<local_path>.progress`
//! after every block; rerunning the same command against an interrupted
//! upload picks up from the last completed block instead of starting
//! over.
//!
//! Exit codes: 0 success, 1 client error (bad usage or HTTP 4xx), 2
//! server error (HTTP 5xx or a transport failure), 3 formatting error.

use std::path::PathBuf;
use std::process::ExitCode;

use resumable_store_sdk::auth::make_upload_token;
use resumable_store_sdk::http::Connection;
use resumable_store_sdk::io::FileReader;
use resumable_store_sdk::json::formatter::Formatter;
use resumable_store_sdk::region::ServiceKind;
use resumable_store_sdk::upload::{ResumableUploader, UploadPolicy, UploadProgress};
use resumable_store_sdk::{Credentials, Error, ErrorKind};

fn usage() -> ! {
    eprintln!("usage: streaming <access_key> <secret_key> <bucket> <key> <local_path>");
    std::process::exit(1);
}

fn exit_code_for(err: &Error) -> ExitCode {
    match err {
        Error::HttpFailWithBody(status, _) if *status >= 500 => ExitCode::from(2),
        Error::HttpFailWithBody(_, _) => ExitCode::from(1),
        Error::Reqwest(_) => ExitCode::from(2),
        Error::Core {
            kind: ErrorKind::JsonBadTextInput | ErrorKind::JsonNotThisType,
            ..
        } => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        usage();
    }
    let access_key = &args[0];
    let secret_key = &args[1];
    let bucket = &args[2];
    let key = &args[3];
    let local_path = &args[4];

    let progress_path = PathBuf::from(format!("{local_path}.progress"));
    let credentials = Credentials::new(access_key.clone(), secret_key.clone());

    let reader = match FileReader::open(local_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("could not open {local_path}: {e}");
            return ExitCode::from(1);
        }
    };

    let mut progress = match std::fs::read_to_string(&progress_path) {
        Ok(saved) => match UploadProgress::from_json_str(&saved).and_then(|p| p.attach(&reader)) {
            Ok(p) => {
                eprintln!("resuming from {}", progress_path.display());
                p
            }
            Err(e) => {
                eprintln!("discarding stale progress file ({e}), starting over");
                UploadProgress::new(
                    reader.size().unwrap_or(0),
                    resumable_store_sdk::constants::BLOCK_SIZE,
                )
            }
        },
        Err(_) => UploadProgress::new(
            match reader.size() {
                Ok(size) => size,
                Err(e) => {
                    eprintln!("could not stat {local_path}: {e}");
                    return ExitCode::from(1);
                }
            },
            resumable_store_sdk::constants::BLOCK_SIZE,
        ),
    };

    let conn = match Connection::with_options(&Default::default()) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("failed to set up connection: {e}");
            return ExitCode::from(2);
        }
    };

    let policy = UploadPolicy::new(bucket.clone(), 3600).with_key(bucket, key);
    let uptoken = match make_upload_token(&credentials, &policy) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to build upload token: {e}");
            return ExitCode::from(1);
        }
    };

    let up_host = resumable_store_sdk::Service::default_for(ServiceKind::Up).entries()[0]
        .base_url
        .clone();

    let uploader = ResumableUploader::new(conn, up_host, uptoken);
    let mut reader = reader;
    let result = uploader.upload(&mut reader, &mut progress, Some(key.as_str())).await;

    // Always checkpoint, whether the run finished or was cut short.
    let _ = std::fs::write(&progress_path, progress.to_json_string());

    match result {
        Ok(value) => {
            let _ = std::fs::remove_file(&progress_path);
            let bytes = Formatter::to_vec(&value, Default::default());
            match String::from_utf8(bytes) {
                Ok(s) => {
                    println!("{s}");
                    ExitCode::SUCCESS
                }
                Err(_) => {
                    eprintln!("server response was not valid UTF-8");
                    ExitCode::from(3)
                }
            }
        }
        Err(e) => {
            eprintln!("upload failed, progress saved to {}: {e}", progress_path.display());
            exit_code_for(&e)
        }
    }
}
