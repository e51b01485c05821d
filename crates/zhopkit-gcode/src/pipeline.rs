//! Block processor pipeline
//!
//! A document arrives as ordered per-layer text blocks. Processors rewrite one
//! block at a time and may keep state across blocks. A processor that fails on
//! a block never aborts the run: the block is passed through unchanged.

use zhopkit_core::Result;

/// What a processor sees besides the block itself
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    /// Index of the block in the document
    pub index: usize,
    /// The whole document as it entered this processor
    pub document: &'a [String],
}

/// Trait for per-block G-code processors
///
/// Implementations get blocks in document order, so state carried between
/// calls (position, layer, extrusion history) stays consistent.
pub trait BlockProcessor: Send {
    /// Get the name/identifier of this processor
    fn name(&self) -> &str;

    /// Get a description of what this processor does
    fn description(&self) -> &str;

    /// Rewrite one block
    fn process_block(&mut self, block: &str, context: &BlockContext<'_>) -> Result<String>;

    /// Check if this processor is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Lets a caller lend a processor to a pipeline and read its state afterwards
impl<P: BlockProcessor + ?Sized> BlockProcessor for &mut P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    fn process_block(&mut self, block: &str, context: &BlockContext<'_>) -> Result<String> {
        (**self).process_block(block, context)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Ordered set of block processors
pub struct ProcessorPipeline<'a> {
    processors: Vec<Box<dyn BlockProcessor + 'a>>,
    fallbacks: usize,
}

impl<'a> ProcessorPipeline<'a> {
    /// Create a new empty processor pipeline
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
            fallbacks: 0,
        }
    }

    /// Register a processor in the pipeline
    ///
    /// Processors are applied in the order they are registered.
    pub fn register(&mut self, processor: Box<dyn BlockProcessor + 'a>) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// List all registered processors
    pub fn list_processors(&self) -> Vec<(&str, &str, bool)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description(), p.is_enabled()))
            .collect()
    }

    /// Blocks that fell back to passthrough so far
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// Run every enabled processor over the document
    pub fn process_document(&mut self, blocks: Vec<String>) -> Vec<String> {
        let mut current = blocks;

        for processor in self.processors.iter_mut() {
            if !processor.is_enabled() {
                continue;
            }

            let mut next = Vec::with_capacity(current.len());
            for (index, block) in current.iter().enumerate() {
                let context = BlockContext {
                    index,
                    document: &current,
                };
                match processor.process_block(block, &context) {
                    Ok(processed) => next.push(processed),
                    Err(e) => {
                        tracing::warn!(
                            "Processor '{}' failed on block {}: {}; passing it through",
                            processor.name(),
                            index,
                            e
                        );
                        self.fallbacks += 1;
                        next.push(block.clone());
                    }
                }
            }
            current = next;
        }

        current
    }
}

impl Default for ProcessorPipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}
