//! Entry point for rendering documents.

use docstitch_config::TemplateConfig;
use docstitch_dom::Document;

use crate::compilation::{
    CompilerOptions, DelimiterSearcher, ScopeData, ScopeDataResolver, Tag, TagParser,
    TemplateCompiler,
};
use crate::error::TemplateError;
use crate::plugins::{TemplateContext, TemplatePlugin, create_default_plugins};
use crate::value::ScopeValue;

pub struct TemplateOptions {
    pub config: TemplateConfig,
    pub plugins: Vec<Box<dyn TemplatePlugin>>,
    /// Replaces the default path walk over the data.
    pub scope_data_resolver: Option<ScopeDataResolver>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            config: TemplateConfig::default(),
            plugins: create_default_plugins(),
            scope_data_resolver: None,
        }
    }
}

/// A named tree compiled as part of a larger document, e.g. a header or
/// the main body.
#[derive(Debug, Clone)]
pub struct DocumentPart {
    pub name: String,
    pub document: Document,
}

pub struct TemplateHandler {
    compiler: TemplateCompiler,
    resolver: Option<ScopeDataResolver>,
}

impl TemplateHandler {
    pub fn new(options: TemplateOptions) -> Result<Self, TemplateError> {
        let TemplateOptions {
            config,
            plugins,
            scope_data_resolver,
        } = options;

        config.validate()?;
        if plugins.is_empty() {
            return Err(TemplateError::NoPlugins);
        }

        let compiler = TemplateCompiler::new(
            DelimiterSearcher::new(&config.delimiters, config.max_depth)?,
            TagParser::new(&config.delimiters)?,
            plugins,
            CompilerOptions::from(&config),
        )?;

        Ok(Self {
            compiler,
            resolver: scope_data_resolver,
        })
    }

    /// Replaces every tag in `doc` using `data`.
    pub async fn process(&self, doc: &mut Document, data: ScopeValue) -> Result<(), TemplateError> {
        let root = doc.root();
        let mut scope = self.scope_data(data);
        let mut context = TemplateContext {
            document: doc,
            compiler: &self.compiler,
            part: None,
        };
        self.compiler.compile(root, &mut scope, &mut context).await
    }

    /// Compiles each part in order against the same data.
    pub async fn process_parts(
        &self,
        parts: &mut [DocumentPart],
        data: ScopeValue,
    ) -> Result<(), TemplateError> {
        let mut scope = self.scope_data(data);
        for DocumentPart { name, document } in parts.iter_mut() {
            log::debug!("compiling part '{}'", name);
            let root = document.root();
            let mut context = TemplateContext {
                document,
                compiler: &self.compiler,
                part: Some(name.as_str()),
            };
            self.compiler.compile(root, &mut scope, &mut context).await?;
        }
        Ok(())
    }

    /// Tags found in `doc`. Their text leaves are isolated as a side effect,
    /// but no tag is replaced.
    pub fn parse_tags(&self, doc: &mut Document) -> Result<Vec<Tag>, TemplateError> {
        let root = doc.root();
        self.compiler.parse_tags(doc, root)
    }

    /// Plain text of `doc`, one line per paragraph.
    pub fn get_text(&self, doc: &Document) -> String {
        let root = doc.root();
        let paragraphs: Vec<String> = doc
            .descendants(root)
            .into_iter()
            .filter(|&id| doc.is_paragraph(id))
            .map(|id| doc.text_content(id))
            .collect();
        if paragraphs.is_empty() {
            doc.text_content(root)
        } else {
            paragraphs.join("\n")
        }
    }

    fn scope_data(&self, data: ScopeValue) -> ScopeData {
        let scope = ScopeData::new(data);
        match &self.resolver {
            Some(resolver) => scope.with_resolver(resolver.clone()),
            None => scope,
        }
    }
}
