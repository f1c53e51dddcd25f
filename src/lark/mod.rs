//! Lark group-chat webhook delivery.
//!
//! The card payload is a fixed external contract: an interactive card with a
//! header block and an ordered element list. Tables are rendered as a
//! `column_set` of weighted columns, each column a single markdown element
//! joining its header and cells with newlines.

use crate::error::{Error, Result};
use crate::report::ReportDocument;
use log::info;
use reqwest::Client;
use serde_json::{json, Value};

const HOOK_BASE_URL: &str = "https://open.larksuite.com/open-apis/bot/v2/hook/";

pub fn header_element(content: &str, color: &str) -> Value {
    json!({
        "title": {"tag": "markdown", "content": content},
        "template": color,
    })
}

pub fn markdown_element(content: &str) -> Value {
    json!({"tag": "markdown", "content": content})
}

pub fn hr_element() -> Value {
    json!({"tag": "hr"})
}

/// One table column: a header plus its cells, top to bottom.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub cells: Vec<String>,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            header: header.into(),
            cells,
        }
    }
}

/// Multi-column tabular element. Empty input renders nothing.
pub fn table_element(columns: &[TableColumn]) -> Option<Value> {
    if columns.is_empty() || columns.iter().all(|c| c.cells.is_empty()) {
        return None;
    }
    let columns: Vec<Value> = columns
        .iter()
        .map(|column| {
            let mut lines = vec![format!("**{}**", column.header)];
            lines.extend(column.cells.iter().cloned());
            json!({
                "tag": "column",
                "width": "weighted",
                "weight": 1,
                "elements": [
                    {"tag": "markdown", "content": lines.join("\n")}
                ],
            })
        })
        .collect();
    Some(json!({
        "tag": "column_set",
        "flex_mode": "none",
        "background_style": "default",
        "horizontal_spacing": "default",
        "columns": columns,
    }))
}

#[derive(Debug, Clone)]
pub struct LarkClient {
    client: Client,
    url: String,
}

impl LarkClient {
    pub fn new(client: Client, key: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", HOOK_BASE_URL, key),
        }
    }

    pub async fn send_card(&self, document: &ReportDocument) -> Result<()> {
        let payload = json!({
            "msg_type": "interactive",
            "card": {
                "header": &document.header,
                "elements": &document.elements,
            },
        });
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::DeliveryError(format!(
                "webhook returned {}",
                status
            )));
        }
        info!("card delivered ({} elements)", document.elements.len());
        Ok(())
    }

    /// Diagnostic card for the error channel, sent after every report pass
    /// has failed.
    pub async fn send_error_report(&self, attempts: u32, error: &Error) -> Result<()> {
        let document = ReportDocument {
            header: header_element("Sol Bot Error 🚨", "red"),
            elements: vec![markdown_element(&format!(
                "**Report failed after {} attempts**\n```\n{}\n```",
                attempts, error
            ))],
        };
        self.send_card(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_element_nests_title_and_template() {
        assert_eq!(
            header_element("Sol Bot Daily - 01 January 2026", "wathet"),
            json!({
                "title": {"tag": "markdown", "content": "Sol Bot Daily - 01 January 2026"},
                "template": "wathet",
            })
        );
    }

    #[test]
    fn table_element_reproduces_the_column_set_contract() {
        let table = table_element(&[
            TableColumn::new("Pool", vec!["[A / SOL](url)".to_string()]),
            TableColumn::new("Dex", vec!["Raydium".to_string()]),
        ])
        .unwrap();
        assert_eq!(
            table,
            json!({
                "tag": "column_set",
                "flex_mode": "none",
                "background_style": "default",
                "horizontal_spacing": "default",
                "columns": [
                    {
                        "tag": "column",
                        "width": "weighted",
                        "weight": 1,
                        "elements": [
                            {"tag": "markdown", "content": "**Pool**\n[A / SOL](url)"}
                        ],
                    },
                    {
                        "tag": "column",
                        "width": "weighted",
                        "weight": 1,
                        "elements": [
                            {"tag": "markdown", "content": "**Dex**\nRaydium"}
                        ],
                    },
                ],
            })
        );
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert!(table_element(&[]).is_none());
        assert!(table_element(&[TableColumn::new("Pool", vec![])]).is_none());
    }

    #[test]
    fn hr_element_is_bare_tag() {
        assert_eq!(hr_element(), json!({"tag": "hr"}));
    }
}
