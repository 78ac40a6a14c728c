//! Minimal quake example: all four decorators around a tiny handler.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/hello
//!   curl -i --compressed http://localhost:3000/hello
//!   curl -i http://localhost:3000/cached
//!   curl -i http://localhost:3000/missing

use http::StatusCode;
use quake::middleware::{dont_cache, gzip, logger, timer};
use quake::{MiddlewareStack, Request, ResponseWriter, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // logger runs outermost, gzip closest to the handler.
    let mut stack = MiddlewareStack::new();
    stack.add_all([logger, timer, dont_cache, gzip]);
    stack.finalize(app);

    Server::bind("0.0.0.0:3000")
        .expect("valid address")
        .serve(stack)
        .await
        .expect("server error");
}

// No router here: quake only composes handlers. Dispatch on the path by hand.
fn app(req: &Request, res: &mut dyn ResponseWriter) {
    let result = match req.path() {
        "/hello" => res.write_all(b"hello, world\n"),

        // Overrides the no-cache default set by dont_cache.
        "/cached" => {
            res.headers_mut().insert("cache-control", "public, max-age=3600".parse().unwrap());
            res.write_all(b"cache me\n")
        }

        _ => {
            res.write_status(StatusCode::NOT_FOUND);
            res.write_all(b"not found\n")
        }
    };

    if let Err(e) = result {
        tracing::warn!("failed to write response: {e}");
    }
}
