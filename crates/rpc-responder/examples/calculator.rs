//! Calculator JSON-RPC Example
//!
//! Serves a small calculator service over line-delimited JSON on stdio.
//! Each input line is one request; each output line is one reply. Replies
//! are written as methods complete, so slow calls do not hold up fast ones.
//!
//! ```text
//! echo '{"jsonrpc":"2.0","id":1,"method":"calc.add","params":{"a":5,"b":3}}' \
//!     | RUST_LOG=debug cargo run -p rpc-responder --example calculator
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rpc_responder::dispatch::{encode_message, parse_request};
use rpc_responder::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Running total shared by the `memory.*` methods
struct Memory {
    total: Mutex<f64>,
}

impl RpcService for Memory {
    fn describe(self: Arc<Self>, namespace: NamespaceBuilder) -> NamespaceBuilder {
        let store = Arc::clone(&self);
        let recall = self;
        namespace
            .method("store", ["value"], move |args: Arguments| {
                let memory = Arc::clone(&store);
                async move {
                    let value: f64 = args.required(0)?;
                    let mut total = memory.total.lock().await;
                    *total += value;
                    Ok::<_, MethodError>(*total)
                }
            })
            .method("recall", Vec::<String>::new(), move |_args: Arguments| {
                let memory = Arc::clone(&recall);
                async move { Ok::<_, MethodError>(*memory.total.lock().await) }
            })
    }
}

fn calculator() -> Result<Service, BuildError> {
    let memory = Arc::new(Memory {
        total: Mutex::new(0.0),
    });

    Service::builder()
        .namespace("calc", |calc| {
            calc.declare("add", "fn add(a: f64, b: f64)", |args: Arguments| async move {
                Ok::<_, MethodError>(args.required::<f64>(0)? + args.required::<f64>(1)?)
            })
            .declare("subtract", "fn subtract(a: f64, b: f64)", |args: Arguments| async move {
                Ok::<_, MethodError>(args.required::<f64>(0)? - args.required::<f64>(1)?)
            })
            .declare("divide", "fn divide(dividend: f64, divisor: f64)", |args: Arguments| async move {
                let divisor: f64 = args.required(1)?;
                if divisor == 0.0 {
                    return Err(MethodError::application(-32000, "Division by zero"));
                }
                Ok::<_, MethodError>(args.required::<f64>(0)? / divisor)
            })
        })
        .callback("slow_echo", ["text", "delay_ms"], |args: Arguments, done: Completion| {
            tokio::spawn(async move {
                let delay = args.optional::<u64>(1).ok().flatten().unwrap_or(500);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                done.complete(args.required::<String>(0));
            });
        })
        .service("memory", memory)
        .value("version", env!("CARGO_PKG_VERSION"))
        .date("started_at", Utc::now())
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let responder = Responder::new(calculator()?);
    info!(
        "Serving {:?}; send {} to list them",
        responder.service().definition().leaf_paths(),
        responder.config().introspection_method
    );

    let (replies, mut outbox) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = outbox.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request = match parse_request(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected input line: {}", e);
                let _ = replies.send(encode_message(&JsonRpcMessage::error(e))?);
                continue;
            }
        };

        let replies = replies.clone();
        responder.respond_with(request, move |reply| match encode_message(&reply) {
            Ok(line) => {
                let _ = replies.send(line);
            }
            Err(e) => warn!("Failed to encode reply: {}", e),
        });
    }

    // Let in-flight calls finish before the writer shuts down.
    drop(replies);
    writer.await??;
    Ok(())
}
