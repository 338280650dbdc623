//! `bucket-ops <access_key> <secret_key> <bucket> <key> <op> [extra...]`
//!
//! Runs one object-management call against the `rs`/`rsf` services and
//! prints the raw JSON response to stdout. `op` is one of `stat`,
//! `delete`, `copy <dst_bucket> <dst_key>`, `move <dst_bucket> <dst_key>`,
//! `list <prefix> [marker] [limit]`, `batch <op> [op...]`.
//!
//! Exit codes: 0 success, 1 client error (bad usage or HTTP 4xx), 2
//! server error (HTTP 5xx or a transport failure), 3 formatting error
//! (the server's response wasn't valid JSON).

use std::process::ExitCode;

use resumable_store_sdk::easy;
use resumable_store_sdk::http::Connection;
use resumable_store_sdk::json::formatter::Formatter;
use resumable_store_sdk::{Credentials, Error, ErrorKind, Region};

fn usage() -> ! {
    eprintln!(
        "usage: bucket-ops <access_key> <secret_key> <bucket> <key> <op> [extra...]\n\
         ops: stat | delete | copy <dst_bucket> <dst_key> | move <dst_bucket> <dst_key> | list <prefix> [marker] [limit] | batch <op> [op...]"
    );
    std::process::exit(1);
}

fn exit_code_for(err: &Error) -> ExitCode {
    match err {
        Error::Core {
            kind: ErrorKind::StorApiReturnNoValue | ErrorKind::StorLackOfAuth,
            ..
        } => ExitCode::from(1),
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
    if args.len() < 5 {
        usage();
    }
    let access_key = &args[0];
    let secret_key = &args[1];
    let bucket = &args[2];
    let key = &args[3];
    let op = args[4].as_str();
    let extra = &args[5..];

    let credentials = Credentials::new(access_key.clone(), secret_key.clone());
    let conn = match Connection::with_options(&Default::default()) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("failed to set up connection: {e}");
            return ExitCode::from(2);
        }
    };
    let region = Region::new();

    let result = match op {
        "stat" => easy::stat(&conn, &credentials, &region, bucket, key).await,
        "delete" => easy::delete(&conn, &credentials, &region, bucket, key).await,
        "copy" if extra.len() == 2 => {
            easy::copy(&conn, &credentials, &region, bucket, key, &extra[0], &extra[1]).await
        }
        "move" if extra.len() == 2 => {
            easy::move_object(&conn, &credentials, &region, bucket, key, &extra[0], &extra[1]).await
        }
        "list" if !extra.is_empty() => {
            let prefix = &extra[0];
            let marker = extra.get(1).map(String::as_str);
            let limit = extra.get(2).and_then(|s| s.parse().ok()).unwrap_or(1000);
            easy::list(&conn, &credentials, &region, bucket, prefix, marker, limit).await
        }
        "batch" if !extra.is_empty() => easy::batch(&conn, &credentials, &region, extra).await,
        _ => usage(),
    };

    match result {
        Ok(value) => {
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
            eprintln!("{op} failed: {e}");
            exit_code_for(&e)
        }
    }
}
