//! LSP backend for the QuakeC analyzer.
//!
//! Thin glue between the editor protocol and the
//! [`SourceDocumentManager`]: requests lock the manager, run the
//! corresponding query, and convert the result. Document sync is full-text;
//! every change triggers a workspace-wide diagnostics publish, because an
//! edit can invalidate any file after it in link order.

use tokio::sync::Mutex;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use quakec_syntax::grammar::Dialect;

use crate::lsp::diagnostics::{
    from_lsp_position, path_to_uri, to_lsp_diagnostic, to_lsp_range, uri_to_path,
};
use crate::workspace::SourceDocumentManager;

/// QuakeC language server over a workspace manager.
pub struct QuakeCLanguageServer {
    client: Client,
    /// Created during `initialize`, once the workspace root is known.
    manager: Mutex<Option<SourceDocumentManager>>,
}

impl QuakeCLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            manager: Mutex::new(None),
        }
    }

    /// Publish current diagnostics for every source document.
    async fn publish_all_diagnostics(&self) {
        let all = {
            let mut guard = self.manager.lock().await;
            match guard.as_mut() {
                Some(manager) => manager.get_diagnostics_all(),
                None => return,
            }
        };

        for (path, diagnostics) in all {
            let Some(uri) = path_to_uri(&path) else { continue };
            let converted = diagnostics.iter().map(to_lsp_diagnostic).collect();
            self.client.publish_diagnostics(uri, converted, None).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for QuakeCLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let root = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok());
        {
            let mut guard = self.manager.lock().await;
            *guard = Some(SourceDocumentManager::new(root.as_deref()));
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "quakec-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "QuakeC language server initialized")
            .await;
        self.publish_all_diagnostics().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(path) = uri_to_path(&params.text_document.uri) else { return };
        {
            let mut guard = self.manager.lock().await;
            if let Some(manager) = guard.as_mut() {
                manager.update_document(&path, params.text_document.version, params.text_document.text);
            }
        }
        self.publish_all_diagnostics().await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(path) = uri_to_path(&params.text_document.uri) else { return };
        // Full sync: the single change carries the whole document.
        let Some(change) = params.content_changes.into_iter().next() else { return };
        {
            let mut guard = self.manager.lock().await;
            if let Some(manager) = guard.as_mut() {
                manager.update_document(&path, params.text_document.version, change.text);
            }
        }
        self.publish_all_diagnostics().await;
    }

    async fn did_close(&self, _: DidCloseTextDocumentParams) {
        // Closed documents stay cached: link-order neighbors still depend on
        // their scopes.
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let dialect = params
            .settings
            .get("quakec")
            .and_then(|settings| settings.get("language"))
            .and_then(|value| value.as_str())
            .and_then(Dialect::from_name);
        let Some(dialect) = dialect else { return };

        {
            let mut guard = self.manager.lock().await;
            if let Some(manager) = guard.as_mut() {
                manager.set_dialect(dialect);
            }
        }
        self.publish_all_diagnostics().await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position_params = params.text_document_position_params;
        let Some(path) = uri_to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };
        let position = from_lsp_position(position_params.position);

        let mut guard = self.manager.lock().await;
        let Some(manager) = guard.as_mut() else { return Ok(None) };
        let Some(signature) = manager.get_hover(&path, position) else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Scalar(MarkedString::LanguageString(LanguageString {
                language: "quakec".to_string(),
                value: signature,
            })),
            range: None,
        }))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let position_params = params.text_document_position_params;
        let Some(path) = uri_to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };
        let position = from_lsp_position(position_params.position);

        let mut guard = self.manager.lock().await;
        let Some(manager) = guard.as_mut() else { return Ok(None) };
        let Some(location) = manager.get_definition(&path, position) else {
            return Ok(None);
        };
        let Some(uri) = path_to_uri(&location.uri) else { return Ok(None) };

        Ok(Some(GotoDefinitionResponse::Scalar(Location {
            uri,
            range: to_lsp_range(location.range),
        })))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let Some(path) = uri_to_path(&params.text_document_position.text_document.uri) else {
            return Ok(None);
        };
        let position = from_lsp_position(params.text_document_position.position);
        let include_declaration = params.context.include_declaration;

        let mut guard = self.manager.lock().await;
        let Some(manager) = guard.as_mut() else { return Ok(None) };

        let locations = manager
            .get_references(&path, position, include_declaration)
            .into_iter()
            .filter_map(|location| {
                Some(Location {
                    uri: path_to_uri(&location.uri)?,
                    range: to_lsp_range(location.range),
                })
            })
            .collect();

        Ok(Some(locations))
    }
}
