//! QuakeC language server binary entry point
//!
//! Run with: quakec-lsp
//!
//! The server communicates via stdin/stdout using the Language Server Protocol.

use quakec::lsp::QuakeCLanguageServer;
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(QuakeCLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
