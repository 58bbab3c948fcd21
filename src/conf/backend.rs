use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MongoConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "MongoConfig::default_port")]
    pub port: u16,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl MongoConfig {
    fn default_port() -> u16 {
        27017
    }

    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: Self::default_port(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CouchConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "CouchConfig::default_port")]
    pub port: u16,
    #[serde(default = "CouchConfig::default_user")]
    pub user: String,
    #[serde(default = "CouchConfig::default_password")]
    pub password: String,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl CouchConfig {
    fn default_port() -> u16 {
        5984
    }

    fn default_user() -> String {
        String::from("admin")
    }

    fn default_password() -> String {
        String::from("root")
    }

    /// Server root without credentials; they travel as basic auth.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: Self::default_port(),
            user: Self::default_user(),
            password: Self::default_password(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_host() -> String {
    String::from("localhost")
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_default() {
        let mongo = MongoConfig::default();
        assert_eq!(mongo.uri(), "mongodb://localhost:27017");
        assert_eq!(mongo.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_couch_default() {
        let couch = CouchConfig::default();
        assert_eq!(couch.base_url(), "http://localhost:5984");
        assert_eq!(couch.user, "admin");
        assert_eq!(couch.password, "root");
    }
}
