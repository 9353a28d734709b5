//! Test assertions
//!
//! Assertion helpers over caches, responses and reload URLs.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use shell_worker::{CacheNames, CacheStorage, NetworkError, Response, UrlParts};

use crate::fixtures::SHELL_MARKER;

/// Assertion result
pub type AssertResult = Result<(), String>;

/// Assert that a condition is true
pub fn assert_true(condition: bool, message: &str) -> AssertResult {
    if condition {
        Ok(())
    } else {
        Err(String::from(message))
    }
}

/// Assert equality
pub fn assert_eq<T: PartialEq + core::fmt::Debug>(left: T, right: T) -> AssertResult {
    if left == right {
        Ok(())
    } else {
        Err(format!("Expected {:?} to equal {:?}", left, right))
    }
}

/// Assert that a string contains a substring
pub fn assert_contains(haystack: &str, needle: &str) -> AssertResult {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(format!("Expected '{}' to contain '{}'", haystack, needle))
    }
}

/// Every manifest entry is in the current precache generation
pub fn assert_precached(caches: &CacheStorage, names: &CacheNames, manifest: &[String]) -> AssertResult {
    let cache = caches
        .get(names.precache())
        .ok_or_else(|| format!("Precache {} does not exist", names.precache()))?;
    let missing: Vec<&str> = manifest
        .iter()
        .map(String::as_str)
        .filter(|url| cache.match_key(url).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Not precached: {:?}", missing))
    }
}

/// The set of generation names is exactly `expected`
pub fn assert_generations(caches: &CacheStorage, expected: &[&str]) -> AssertResult {
    let mut actual = caches.keys();
    actual.sort();
    let mut expected: Vec<String> = expected.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq(actual, expected)
}

/// A successful response carrying the app shell
pub fn assert_serves_shell(result: &Result<Response, NetworkError>) -> AssertResult {
    let response = result
        .as_ref()
        .map_err(|e| format!("Expected the shell, got error {}", e))?;
    assert_true(response.ok(), "Shell response is not 2xx")?;
    assert_true(!response.body.is_empty(), "Shell response is empty")?;
    let body = core::str::from_utf8(&response.body).map_err(|_| String::from("Shell is not UTF-8"))?;
    assert_contains(body, SHELL_MARKER)
}

/// `url` carries `param=timestamp` exactly once in its query
pub fn assert_cache_busted(url: &str, param: &str, timestamp: u64) -> AssertResult {
    let query = UrlParts::parse(url).query.unwrap_or("");
    let stamp = format!("{}={}", param, timestamp);
    let prefix = format!("{}=", param);
    let occurrences = query
        .split('&')
        .filter(|pair| pair.starts_with(&prefix))
        .count();
    assert_true(
        query.split('&').any(|pair| pair == stamp),
        &format!("Expected {} in {}", stamp, url),
    )?;
    assert_eq(occurrences, 1)
}
