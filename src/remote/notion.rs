//! `RemoteTree` backed by Notion's private v3 API.
//!
//! Authentication uses the `token_v2` browser cookie. Blocks are read with
//! `syncRecordValues` and written with `submitTransaction`, the same calls
//! the Notion web client makes.

use super::{BlockKind, NewBlock, NodeId, Placement, RemoteError, RemoteNode, RemoteTree, Session};
use crate::models::{BlockType, Color};
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const API_BASE: &str = "https://www.notion.so/api/v3";
const USER_AGENT: &str = concat!("booknote/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
struct BlockRecord {
    id: String,
    #[serde(default = "default_alive")]
    alive: bool,
    #[serde(default)]
    content: Vec<String>,
    #[serde(default)]
    properties: Option<Value>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    space_id: Option<String>,
}

fn default_alive() -> bool {
    true
}

impl BlockRecord {
    fn title(&self) -> Option<String> {
        self.properties.as_ref().and_then(rich_text_title)
    }
}

pub struct NotionClient {
    http: Client,
    token: String,
    base_url: String,
    space_id: Option<String>,
}

impl NotionClient {
    pub fn new(token: &str) -> Result<Self, RemoteError> {
        Self::with_base_url(token, API_BASE)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, RemoteError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(NotionClient {
            http,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            space_id: None,
        })
    }

    /// Resolves `page` (URL or id) and checks the token can read it.
    pub fn connect(token: &str, page: &str) -> Result<Session<Self>, RemoteError> {
        Self::connect_at(API_BASE, token, page)
    }

    pub fn connect_at(base_url: &str, token: &str, page: &str) -> Result<Session<Self>, RemoteError> {
        if token.is_empty() {
            return Err(RemoteError::MissingToken);
        }
        let page_id =
            parse_page_id(page).ok_or_else(|| RemoteError::InvalidPage(page.to_string()))?;

        let mut client = NotionClient::with_base_url(token, base_url)?;
        let root = client.load_block(&page_id)?;
        client.space_id = root.space_id.clone();
        debug!(page = %root.id, "Connected to Notion page");

        Ok(Session::new(client, NodeId(root.id)))
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value, RemoteError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint))
            .header(COOKIE, format!("token_v2={}", self.token))
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>()?)
    }

    fn load_blocks(&self, ids: &[String]) -> Result<Vec<BlockRecord>, RemoteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let requests: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "pointer": { "table": "block", "id": id }, "version": -1 }))
            .collect();
        let response = self.post("syncRecordValues", &json!({ "requests": requests }))?;

        let mut records = parse_block_records(&response)
            .map_err(|reason| RemoteError::Malformed {
                endpoint: "syncRecordValues".to_string(),
                reason,
            })?;

        Ok(ids.iter().filter_map(|id| records.remove(id)).collect())
    }

    fn load_block(&self, id: &str) -> Result<BlockRecord, RemoteError> {
        self.load_blocks(&[id.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(NodeId(id.to_string())))
    }

    fn parent_of(&self, id: &NodeId) -> Result<String, RemoteError> {
        self.load_block(id.as_str())?
            .parent_id
            .ok_or_else(|| RemoteError::NotFound(id.clone()))
    }

    fn submit(&self, operations: Vec<Value>) -> Result<(), RemoteError> {
        debug!(operations = operations.len(), "Submitting Notion transaction");
        self.post("submitTransaction", &json!({ "operations": operations }))?;
        Ok(())
    }
}

impl RemoteTree for NotionClient {
    fn children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, RemoteError> {
        let block = self.load_block(parent.as_str())?;
        let children = self.load_blocks(&block.content)?;

        Ok(children
            .into_iter()
            .filter(|child| child.alive)
            .map(|child| RemoteNode {
                title: child.title(),
                id: NodeId(child.id),
            })
            .collect())
    }

    fn create_child(&self, parent: &NodeId, block: NewBlock<'_>) -> Result<NodeId, RemoteError> {
        let id = new_block_id();
        let now = chrono::Utc::now().timestamp_millis();

        let record = block_record_args(&id, parent, block, self.space_id.as_deref(), now);
        self.submit(vec![
            operation(&id, &[], "set", record),
            operation(parent.as_str(), &["content"], "listAfter", json!({ "id": id })),
        ])?;

        Ok(NodeId(id))
    }

    fn move_node(&self, node: &NodeId, placement: Placement<'_>) -> Result<(), RemoteError> {
        let old_parent = self.parent_of(node)?;
        let (new_parent, list_args) = match placement {
            Placement::LastChildOf(parent) => (parent.to_string(), json!({ "id": node.as_str() })),
            Placement::After(sibling) => (
                self.parent_of(sibling)?,
                json!({ "id": node.as_str(), "after": sibling.as_str() }),
            ),
        };

        self.submit(vec![
            operation(&old_parent, &["content"], "listRemove", json!({ "id": node.as_str() })),
            operation(
                node.as_str(),
                &[],
                "update",
                json!({ "parent_id": new_parent, "parent_table": "block", "alive": true }),
            ),
            operation(&new_parent, &["content"], "listAfter", list_args),
        ])
    }
}

fn notion_type(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Divider => "divider",
        BlockKind::Styled(block_type) => match block_type {
            BlockType::HeaderBlock => "header",
            BlockType::SubheaderBlock => "sub_header",
            BlockType::SubsubheaderBlock => "sub_sub_header",
            BlockType::QuoteBlock => "quote",
            BlockType::TextBlock => "text",
            BlockType::PageBlock => "page",
            BlockType::BulletedListBlock => "bulleted_list",
            BlockType::TodoBlock => "to_do",
            BlockType::CalloutBlock => "callout",
            BlockType::ToggleBlock => "toggle",
        },
    }
}

fn operation(id: &str, path: &[&str], command: &str, args: Value) -> Value {
    json!({
        "id": id,
        "table": "block",
        "path": path,
        "command": command,
        "args": args,
    })
}

fn block_record_args(
    id: &str,
    parent: &NodeId,
    block: NewBlock<'_>,
    space_id: Option<&str>,
    now: i64,
) -> Value {
    let mut args = json!({
        "id": id,
        "type": notion_type(block.kind),
        "version": 1,
        "alive": true,
        "created_time": now,
        "last_edited_time": now,
        "parent_id": parent.as_str(),
        "parent_table": "block",
    });

    if let Some(space_id) = space_id {
        args["space_id"] = json!(space_id);
    }
    if let Some(title) = block.title {
        args["properties"] = json!({ "title": [[title]] });
    }
    if block.color != Color::Default {
        args["format"] = json!({ "block_color": block.color.as_str() });
    }

    args
}

fn parse_block_records(response: &Value) -> Result<HashMap<String, BlockRecord>, String> {
    let blocks = match response.pointer("/recordMap/block") {
        Some(Value::Object(blocks)) => blocks,
        Some(_) => return Err("recordMap.block is not an object".to_string()),
        None => return Ok(HashMap::new()),
    };

    let mut records = HashMap::new();
    for (id, entry) in blocks {
        // Newer responses wrap the record once more: { value: { value, role } }.
        let value = match entry.get("value") {
            Some(inner) if inner.get("id").is_none() => inner.get("value"),
            other => other,
        };
        let Some(value) = value.filter(|v| v.is_object()) else {
            continue;
        };

        let record: BlockRecord = serde_json::from_value(value.clone())
            .map_err(|e| format!("block {}: {}", id, e))?;
        records.insert(id.clone(), record);
    }

    Ok(records)
}

/// Concatenated plain text of a rich-text `title` property.
fn rich_text_title(properties: &Value) -> Option<String> {
    let segments = properties.get("title")?.as_array()?;

    Some(
        segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect(),
    )
}

/// Extracts the 32-hex block id from a page URL or a bare/dashed id.
pub fn parse_page_id(reference: &str) -> Option<String> {
    let without_query = reference.split(['?', '#']).next()?.trim_end_matches('/');
    let last_segment = without_query.rsplit('/').next()?;

    let chars: Vec<char> = last_segment.chars().filter(|c| *c != '-').collect();
    if chars.len() < 32 {
        return None;
    }
    let simple: String = chars[chars.len() - 32..].iter().collect();

    Uuid::try_parse(&simple)
        .ok()
        .map(|id| id.hyphenated().to_string())
}

fn new_block_id() -> String {
    Uuid::new_v4().to_string()
}
