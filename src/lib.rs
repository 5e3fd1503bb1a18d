pub mod browser;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod element;
pub mod error;
pub mod filler;
pub mod knowledge;
pub mod page;
pub mod provider;
pub mod resolver;
pub mod selectors;
pub mod semantic;
pub mod session;
pub mod stealth;

pub use browser::AgenticBrowser;
pub use classifier::{FieldClassifier, FieldDescriptor, WidgetKind};
pub use config::{ApplyConfig, BrowserBuilder, BrowserConfig, DefaultPolicy};
pub use controller::{AbortReason, ApplicationOutcome, ApplyState, NavControl, StepController};
pub use error::{Error, Result};
pub use filler::{DropdownStrategy, FillOutcome, FormFiller, SkipReason, DROPDOWN_STRATEGIES};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, Value};
pub use page::Page;
pub use provider::{DocumentProvider, SelectOption, Selector, WaitCondition};
pub use resolver::{Answer, AnswerResolver, AnswerSource, ResolvedValue};
pub use semantic::{SemanticMatcher, TfIdfMatcher};
pub use session::{ApplySession, BatchReport, JobReport};
