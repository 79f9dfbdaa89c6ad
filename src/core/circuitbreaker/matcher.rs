use super::{MatchString, MatchType};
use crate::{logging, utils, Result};
use lru::LruCache;
use regex::Regex;
use std::fmt;
use std::sync::Mutex;

/// `CompileFn` turns a pattern into a regular expression,
/// it is injected so that callers may tune or instrument the compilation.
pub type CompileFn = dyn Fn(&str) -> Result<Regex> + Send + Sync;

fn default_compile(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern)?)
}

/// RegexCache caches the compiled patterns of the rules.
/// API paths have a high cardinality, each pattern is compiled once
/// and kept until it becomes the least recently used one.
pub struct RegexCache {
    cache: Mutex<LruCache<String, Regex>>,
    compile: Box<CompileFn>,
}

impl fmt::Debug for RegexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexCache")
            .field("len", &self.len())
            .finish()
    }
}

impl RegexCache {
    pub fn new(cap: usize) -> Self {
        Self::with_compile_fn(cap, Box::new(default_compile))
    }

    pub fn with_compile_fn(cap: usize, compile: Box<CompileFn>) -> Self {
        RegexCache {
            cache: Mutex::new(LruCache::new(cap.max(1))),
            compile,
        }
    }

    /// `get` returns the compiled pattern, compiling it on a miss.
    /// `None` means the pattern does not compile.
    pub fn get(&self, pattern: &str) -> Option<Regex> {
        let key = pattern.to_owned();
        if let Some(regex) = self.cache.lock().unwrap().get(&key) {
            return Some(regex.clone());
        }
        // compile outside the lock, a concurrent miss just compiles twice
        match (self.compile)(pattern) {
            Ok(regex) => {
                self.cache.lock().unwrap().put(key, regex.clone());
                Some(regex)
            }
            Err(err) => {
                logging::warn!(
                    "[CircuitBreaker RegexCache] Fail to compile pattern {:?}, reason: {:?}",
                    pattern,
                    err
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchString {
    /// `matches` checks the input against the pattern.
    /// Wildcard values (empty or `*`) of `Exact` and `Regex` patterns match anything.
    pub fn matches(&self, input: &str, regexes: &RegexCache) -> bool {
        let regex = self.compile(regexes);
        self.matches_compiled(input, regex.as_ref())
    }

    fn compile(&self, regexes: &RegexCache) -> Option<Regex> {
        match self.match_type {
            MatchType::Regex if !utils::is_wildcard(&self.value) => regexes.get(&self.value),
            _ => None,
        }
    }

    fn matches_compiled(&self, input: &str, regex: Option<&Regex>) -> bool {
        match self.match_type {
            MatchType::Exact => utils::is_wildcard(&self.value) || self.value == input,
            MatchType::Regex => {
                utils::is_wildcard(&self.value) || regex.map_or(false, |regex| regex.is_match(input))
            }
            MatchType::NotEquals => self.value != input,
            MatchType::In => self.value.split(',').any(|v| v.trim() == input),
            MatchType::NotIn => !self.value.split(',').any(|v| v.trim() == input),
        }
    }
}

/// `CompiledMatch` is a `MatchString` whose pattern was compiled up front,
/// matching it never touches the shared `RegexCache`.
#[derive(Debug, Clone)]
pub struct CompiledMatch {
    pattern: MatchString,
    regex: Option<Regex>,
}

impl CompiledMatch {
    pub fn new(pattern: &MatchString, regexes: &RegexCache) -> Self {
        CompiledMatch {
            regex: pattern.compile(regexes),
            pattern: pattern.clone(),
        }
    }

    pub fn pattern(&self) -> &MatchString {
        &self.pattern
    }

    #[inline]
    pub fn matches(&self, input: &str) -> bool {
        self.pattern.matches_compiled(input, self.regex.as_ref())
    }
}
