//! In-memory state behind the mock Revue API

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::{messages, RevuePayload};
use crate::common::config::Credentials;

/// A stored revue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRevue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub url: String,
}

impl StoredRevue {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "title": self.title,
            "description": self.description,
            "url": self.url,
        })
    }
}

/// Status code and JSON body produced by a store operation
pub type Reply = (u16, Value);

/// The single account, its current token and revues in creation order
#[derive(Debug)]
pub struct RevueStore {
    credentials: Credentials,
    /// Each login replaces the previous token
    token: Option<String>,
    revues: Vec<StoredRevue>,
}

impl RevueStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: None,
            revues: Vec::new(),
        }
    }

    pub fn revues(&self) -> &[StoredRevue] {
        &self.revues
    }

    /// Find a revue by id
    pub fn get(&self, id: &str) -> Option<&StoredRevue> {
        let id = Uuid::parse_str(id).ok()?;
        self.revues.iter().find(|r| r.id == id)
    }

    /// `POST /User/Authentication`
    pub fn authenticate(&mut self, body: &Value) -> Reply {
        let email = body.get("email").and_then(Value::as_str);
        let password = body.get("password").and_then(Value::as_str);

        if email != Some(self.credentials.email.as_str())
            || password != Some(self.credentials.password.as_str())
        {
            return (401, json!({ "msg": "Invalid email or password!" }));
        }

        let token = Uuid::new_v4().simple().to_string();
        self.token = Some(token.clone());
        (
            200,
            json!({ "email": self.credentials.email, "accessToken": token }),
        )
    }

    /// Whether `token` is the account's current token
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        token.is_some() && token == self.token.as_deref()
    }

    /// `POST /Revue/Create`
    pub fn create(&mut self, body: &Value) -> Reply {
        let payload = match validate(body) {
            Ok(payload) => payload,
            Err(reply) => return reply,
        };

        self.revues.push(StoredRevue {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            url: payload.url,
        });
        (200, json!({ "msg": messages::CREATED }))
    }

    /// `GET /Revue/All`
    pub fn list(&self) -> Reply {
        let records: Vec<Value> = self.revues.iter().map(StoredRevue::to_json).collect();
        (200, Value::Array(records))
    }

    /// `PUT /Revue/Edit?revueId=...`
    pub fn edit(&mut self, id: Option<&str>, body: &Value) -> Reply {
        let payload = match validate(body) {
            Ok(payload) => payload,
            Err(reply) => return reply,
        };

        let Some(index) = self.position(id) else {
            return no_such_revue();
        };

        let revue = &mut self.revues[index];
        revue.title = payload.title;
        revue.description = payload.description;
        revue.url = payload.url;
        (200, json!({ "msg": messages::EDITED }))
    }

    /// `DELETE /Revue/Delete?revueId=...`
    pub fn delete(&mut self, id: Option<&str>) -> Reply {
        let Some(index) = self.position(id) else {
            return no_such_revue();
        };

        self.revues.remove(index);
        (200, json!({ "msg": messages::DELETED }))
    }

    fn position(&self, id: Option<&str>) -> Option<usize> {
        let id = Uuid::parse_str(id?).ok()?;
        self.revues.iter().position(|r| r.id == id)
    }
}

fn no_such_revue() -> Reply {
    (400, json!({ "msg": messages::NO_SUCH_REVUE }))
}

/// Title and description are required and non-empty; url is optional
fn validate(body: &Value) -> std::result::Result<RevuePayload, Reply> {
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or("");

    let mut errors = Map::new();
    for (name, label) in [("title", "Title"), ("description", "Description")] {
        if field(name).trim().is_empty() {
            errors.insert(
                label.to_string(),
                json!([format!("The {} field is required.", label)]),
            );
        }
    }

    if !errors.is_empty() {
        return Err((
            400,
            json!({
                "title": "One or more validation errors occurred.",
                "status": 400,
                "errors": errors,
            }),
        ));
    }

    Ok(RevuePayload::new(field("title"), field("description")).with_url(field("url")))
}
