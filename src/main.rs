//! `stackinabox` fixture tool.
//!
//! ```text
//! stackinabox check <FIXTURE>
//!     → load, validate, print registered services
//!
//! stackinabox request <FIXTURE> <METHOD> <URL> [--header K:V]... [--json]
//!     → build router, intercept one request, print the response
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use http::{HeaderName, HeaderValue, Method, Request, Response};
use hyper::body::Bytes;
use serde_json::{json, Map, Value};

use stackinabox::config::load_fixture;
use stackinabox::observability::logging::{init_logging, DEFAULT_FILTER, VERBOSE_FILTER};
use stackinabox::{ReplyBody, Router, ServiceNode};

#[derive(Parser)]
#[command(name = "stackinabox")]
#[command(about = "Check fixtures and replay requests against mock services", long_about = None)]
struct Cli {
    /// Log dispatch decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a fixture
    Check {
        fixture: PathBuf,
    },
    /// Send one request through the fixture's services
    Request {
        fixture: PathBuf,
        method: String,
        url: String,
        /// Request header as NAME:VALUE, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })?;

    match cli.command {
        Commands::Check { fixture } => {
            let config = load_fixture(&fixture)?;
            let router = config.build_router()?;
            println!(
                "{}: {} service(s), {:?}",
                fixture.display(),
                router.len(),
                router.version()
            );
            for (key, node) in router.services() {
                print_tree(key, node, 1);
            }
        }
        Commands::Request {
            fixture,
            method,
            url,
            headers,
            json,
        } => {
            let router = load_fixture(&fixture)?.build_router()?;
            let response = send(&router, &method, &url, &headers)?;
            let status = response.status();
            let version = response.version();
            let response_headers = response.headers().clone();
            let body = response.into_body();
            let trailers = body.trailers().cloned();
            let body = body.into_string()?;

            if json {
                let doc = json!({
                    "status": status.as_u16(),
                    "version": format!("{:?}", version),
                    "headers": header_object(&response_headers),
                    "trailers": trailers.as_ref().map(header_object),
                    "body": body,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{:?} {}", version, status);
                for (name, value) in &response_headers {
                    println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
                }
                println!();
                println!("{}", body);
                for (name, value) in trailers.iter().flatten() {
                    println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
                }
            }
        }
    }

    Ok(())
}

fn send(
    router: &Router,
    method: &str,
    url: &str,
    headers: &[String],
) -> Result<Response<ReplyBody>, Box<dyn std::error::Error>> {
    let mut request = Request::builder()
        .method(Method::from_bytes(method.to_ascii_uppercase().as_bytes())?)
        .uri(url);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header {:?} is not NAME:VALUE", header))?;
        request = request.header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }

    let request = request.body(Bytes::new())?;
    Ok(router.intercept(request)?)
}

fn header_object(headers: &http::HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        map.insert(name.to_string(), Value::Array(values));
    }
    Value::Object(map)
}

fn print_tree(key: &str, node: &ServiceNode, depth: usize) {
    let mut methods: Vec<&str> = node.methods().map(|m| m.as_str()).collect();
    methods.sort_unstable();
    println!(
        "{:indent$}{} [{}] {}",
        "",
        key,
        node.name(),
        methods.join(","),
        indent = depth * 2
    );

    let mut children: Vec<&ServiceNode> = node.children().collect();
    children.sort_by(|a, b| a.name().cmp(b.name()));
    for child in children {
        let pattern = child
            .matcher()
            .as_path()
            .and_then(|p| p.pattern())
            .unwrap_or_default();
        print_tree(pattern, child, depth + 1);
    }
}
