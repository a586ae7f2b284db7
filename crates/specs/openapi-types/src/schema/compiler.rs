//! Validator compilation and the process-wide compilation cache.

use super::{NodeSchema, references, registry};
use crate::error::{OpenApiError, OpenApiResult};
use crate::validation::SchemaViolation;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

static GLOBAL: Lazy<SchemaCompiler> = Lazy::new(SchemaCompiler::default);

/// JSON Schema dialect used to compile rendered node schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaDraft {
    #[serde(rename = "2019-09")]
    Draft2019_09,
    #[default]
    #[serde(rename = "2020-12")]
    Draft2020_12,
}

impl From<SchemaDraft> for jsonschema::Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft2019_09 => jsonschema::Draft::Draft201909,
            SchemaDraft::Draft2020_12 => jsonschema::Draft::Draft202012,
        }
    }
}

/// Validator compilation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Dialect the rendered schemas are compiled under
    pub draft: SchemaDraft,
    /// Whether `format` annotations are asserted
    pub validate_formats: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            draft: SchemaDraft::Draft2020_12,
            validate_formats: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(mut self, draft: SchemaDraft) -> Self {
        self.draft = draft;
        self
    }

    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }
}

/// A compiled checker for one node schema and its reference closure.
pub struct CompiledValidator {
    id: String,
    closure: Vec<String>,
    inner: jsonschema::Validator,
}

impl CompiledValidator {
    /// Identifier of the root schema
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifiers of every schema compiled in alongside the root
    pub fn closure(&self) -> &[String] {
        &self.closure
    }

    /// Whether `value` conforms to the schema
    pub fn check(&self, value: &Value) -> bool {
        self.inner.is_valid(value)
    }

    /// Lazily enumerate every violation in `value`.
    pub fn errors<'a>(&'a self, value: &'a Value) -> impl Iterator<Item = SchemaViolation> + 'a {
        self.inner.iter_errors(value).map(|error| {
            SchemaViolation::new(error.instance_path.to_string(), error.to_string())
        })
    }

    /// Check `value`, failing with the complete violation list.
    pub fn type_check(&self, value: &Value) -> OpenApiResult<()> {
        if self.check(value) {
            return Ok(());
        }
        let violations: Vec<SchemaViolation> = self.errors(value).collect();
        debug!(
            node = %self.id,
            violations = violations.len(),
            "type check failed"
        );
        Err(OpenApiError::type_check(&self.id, violations))
    }
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("id", &self.id)
            .field("closure", &self.closure)
            .finish_non_exhaustive()
    }
}

struct CacheEntry {
    // Held so the schema address used as key is never reused.
    _schema: Arc<NodeSchema>,
    validator: Arc<CompiledValidator>,
}

/// Compiles node schemas into validators, caching by schema identity.
pub struct SchemaCompiler {
    config: CompilerConfig,
    cache: DashMap<usize, CacheEntry>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl SchemaCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            cache: DashMap::new(),
        }
    }

    /// The process-wide compiler used by every [`crate::Node`].
    pub fn global() -> &'static SchemaCompiler {
        &GLOBAL
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `schema`, reusing a cached validator when one exists.
    ///
    /// Two threads racing on the same schema may both compile; the first
    /// insert wins and both observe the same validator afterwards.
    pub fn compile(&self, schema: &Arc<NodeSchema>) -> OpenApiResult<Arc<CompiledValidator>> {
        let key = Arc::as_ptr(schema) as usize;
        if let Some(entry) = self.cache.get(&key) {
            trace!(schema = schema.id(), "validator cache hit");
            return Ok(Arc::clone(&entry.validator));
        }

        let compiled = Arc::new(self.compile_uncached(schema)?);
        let entry = self.cache.entry(key).or_insert_with(|| CacheEntry {
            _schema: Arc::clone(schema),
            validator: compiled,
        });
        Ok(Arc::clone(&entry.validator))
    }

    /// Compile `schema` without consulting or filling the cache.
    pub fn compile_uncached(&self, schema: &Arc<NodeSchema>) -> OpenApiResult<CompiledValidator> {
        let closure = references(schema)?;
        let document = schema.to_json_schema(&closure);

        let inner = jsonschema::options()
            .with_draft(self.config.draft.into())
            .should_validate_formats(self.config.validate_formats)
            .build(&document)
            .map_err(|err| OpenApiError::schema_compile(schema.id(), err.to_string()))?;

        debug!(
            schema = schema.id(),
            references = closure.len(),
            recursive = schema.is_recursive(),
            "compiled node validator"
        );

        Ok(CompiledValidator {
            id: schema.id().to_string(),
            closure: closure.iter().map(|s| s.id().to_string()).collect(),
            inner,
        })
    }

    /// Whether a validator for `schema` is already cached
    pub fn is_cached(&self, schema: &Arc<NodeSchema>) -> bool {
        self.cache.contains_key(&(Arc::as_ptr(schema) as usize))
    }

    /// Number of cached validators
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Compile every registered node schema up front.
    pub fn warm_up(&self) -> OpenApiResult<usize> {
        let schemas = registry::all();
        for schema in &schemas {
            self.compile(schema)?;
        }
        Ok(schemas.len())
    }
}

impl fmt::Debug for SchemaCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCompiler")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish()
    }
}
