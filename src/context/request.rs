//! Web request view used by the dispatcher.

use std::collections::BTreeMap;

use axum::http::Method;

use crate::context::user::User;

/// One key/value namespace (query, posted body, cookies, session).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An inbound web request, already delivered by the host server.
///
/// Immutable for the duration of a dispatch pass.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    id: String,
    path: String,
    method: Method,
    query: Params,
    body: Params,
    cookies: Params,
    session: Params,
    user: User,
    reload: bool,
}

impl HttpRequest {
    /// A GET request for `path` from an anonymous user.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            path: path.into(),
            method,
            query: Params::new(),
            body: Params::new(),
            cookies: Params::new(),
            session: Params::new(),
            user: User::anonymous(),
            reload: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Params) -> Self {
        self.body = body;
        self
    }

    pub fn with_cookies(mut self, cookies: Params) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_session(mut self, session: Params) -> Self {
        self.session = session;
        self
    }

    /// Marks the request as an explicit partial reload.
    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn query(&self) -> &Params {
        &self.query
    }

    pub fn body(&self) -> &Params {
        &self.body
    }

    pub fn cookies(&self) -> &Params {
        &self.cookies
    }

    pub fn session(&self) -> &Params {
        &self.session
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn is_reload(&self) -> bool {
        self.reload
    }

    /// Looks a value up in the posted body first, then the query string.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.body.get(key).or_else(|| self.query.get(key))
    }
}
