//! In-memory document for driving the engine without a browser.
//!
//! Nodes carry the exact simple selectors they answer to; a CSS selector
//! list matches a node when one of its comma-separated parts equals one of
//! the node's selectors. Nodes belong to a page (or to every page) and a
//! handle to a node on another page behaves like a stale element.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use agentic_apply::{
    ApplyConfig, DocumentProvider, Error, Result, SelectOption, Selector, WaitCondition,
};

/// What clicking (or typing into) a node does to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Flip the checked state.
    Toggle,
    /// Select this radio and clear its siblings.
    SelectRadio,
    /// Make the given nodes visible.
    Reveal(Vec<usize>),
    /// Show this node's text in the dropdown trigger and close the list.
    Pick(usize),
    /// Switch to another page.
    GoTo(usize),
    /// The interaction throws.
    Fail,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub page: Option<usize>,
    pub parent: Option<usize>,
    pub css: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub value: String,
    pub selected: bool,
    pub enabled: bool,
    pub displayed: bool,
    pub options: Vec<SelectOption>,
    pub label: Option<String>,
    pub preceding: Option<String>,
    pub container: String,
    pub on_click: Effect,
    pub on_type: Effect,
}

impl Node {
    pub fn new(css: &[&str]) -> Self {
        Self {
            page: None,
            parent: None,
            css: css.iter().map(|s| s.to_string()).collect(),
            attrs: Vec::new(),
            text: String::new(),
            value: String::new(),
            selected: false,
            enabled: true,
            displayed: true,
            options: Vec::new(),
            label: None,
            preceding: None,
            container: String::new(),
            on_click: Effect::None,
            on_type: Effect::None,
        }
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.into();
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn preceding(mut self, text: &str) -> Self {
        self.preceding = Some(text.into());
        self
    }

    pub fn container(mut self, text: &str) -> Self {
        self.container = text.into();
        self
    }

    /// `(text, value)` pairs; the first one starts out selected.
    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .enumerate()
            .map(|(i, (text, value))| SelectOption {
                text: text.to_string(),
                value: value.to_string(),
                selected: i == 0,
            })
            .collect();
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn on_type(mut self, effect: Effect) -> Self {
        self.on_type = effect;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => css
                .split(',')
                .map(str::trim)
                .any(|part| self.css.iter().any(|own| own == part)),
            Selector::ButtonText(text) => {
                self.css.iter().any(|own| own.starts_with("button"))
                    && self.text.contains(text.as_str())
            }
            Selector::XPath(_) => false,
        }
    }
}

#[derive(Default)]
struct State {
    nodes: Vec<Node>,
    page: usize,
    clicks: Vec<usize>,
    checkpoints: Vec<String>,
    disconnected: bool,
}

impl State {
    fn live(&self, id: usize) -> Result<&Node> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| Error::ElementNotFound(format!("node {id}")))?;
        match node.page {
            Some(page) if page != self.page => {
                Err(Error::ElementNotFound(format!("stale element {id}")))
            }
            _ => Ok(node),
        }
    }

    fn matching(&self, selector: &Selector) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&id| self.live(id).is_ok_and(|n| n.matches(selector)))
            .collect()
    }

    fn is_descendant(&self, id: usize, ancestor: usize) -> bool {
        let mut cursor = self.nodes[id].parent;
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            cursor = self.nodes[parent].parent;
        }
        false
    }

    fn apply(&mut self, id: usize, effect: Effect) -> Result<()> {
        match effect {
            Effect::None => {}
            Effect::Toggle => self.nodes[id].selected = !self.nodes[id].selected,
            Effect::SelectRadio => {
                let parent = self.nodes[id].parent;
                for node in &mut self.nodes {
                    if node.parent == parent && node.on_click == Effect::SelectRadio {
                        node.selected = false;
                    }
                }
                self.nodes[id].selected = true;
            }
            Effect::Reveal(ids) => {
                for target in ids {
                    self.nodes[target].displayed = true;
                }
            }
            Effect::Pick(dropdown) => {
                self.nodes[dropdown].text = self.nodes[id].text.clone();
                for node in &mut self.nodes {
                    if node.on_click == Effect::Pick(dropdown) {
                        node.displayed = false;
                    }
                }
            }
            Effect::GoTo(page) => self.page = page,
            Effect::Fail => {
                return Err(Error::InteractionFailed(format!(
                    "element {id} is not interactable"
                )))
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDocument {
    state: Mutex<State>,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, node: Node) -> usize {
        let mut state = self.state.lock().unwrap();
        state.nodes.push(node);
        state.nodes.len() - 1
    }

    pub fn node(&self, id: usize) -> Node {
        self.state.lock().unwrap().nodes[id].clone()
    }

    pub fn set_on_click(&self, id: usize, effect: Effect) {
        self.state.lock().unwrap().nodes[id].on_click = effect;
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().unwrap().page
    }

    pub fn go_to(&self, page: usize) {
        self.state.lock().unwrap().page = page;
    }

    /// Every later lookup fails as if the browser connection dropped.
    pub fn disconnect(&self) {
        self.state.lock().unwrap().disconnected = true;
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn checkpoints(&self) -> Vec<String> {
        self.state.lock().unwrap().checkpoints.clone()
    }

    // ── Widgets ─────────────────────────────────────────────────────

    pub fn text_input(&self, page: usize, label: &str) -> usize {
        self.add(
            Node::new(&["input[type='text']"])
                .on_page(page)
                .attr("aria-label", label),
        )
    }

    pub fn checkbox(&self, page: usize, label: &str) -> usize {
        self.add(
            Node::new(&["input[type='checkbox']"])
                .on_page(page)
                .label(label)
                .on_click(Effect::Toggle),
        )
    }

    /// A fieldset with a legend and one radio per choice.
    pub fn radio_group(&self, page: usize, question: &str, choices: &[&str]) -> (usize, Vec<usize>) {
        let group = self.add(Node::new(&["fieldset"]).on_page(page));
        self.add(Node::new(&["legend"]).on_page(page).child_of(group).text(question));
        let radios = choices
            .iter()
            .map(|choice| {
                self.add(
                    Node::new(&["input[type='radio']"])
                        .on_page(page)
                        .child_of(group)
                        .attr("value", choice)
                        .on_click(Effect::SelectRadio),
                )
            })
            .collect();
        (group, radios)
    }

    pub fn native_select(&self, page: usize, label: &str, options: &[(&str, &str)]) -> usize {
        self.add(
            Node::new(&["select"])
                .on_page(page)
                .label(label)
                .container(label)
                .options(options),
        )
    }

    /// A combobox trigger whose options appear once it is clicked.
    pub fn dropdown(&self, page: usize, label: &str, choices: &[&str]) -> (usize, Vec<usize>) {
        let trigger = self.add(
            Node::new(&["div[role='combobox']"])
                .on_page(page)
                .attr("aria-label", label)
                .text("Select an option"),
        );
        let options: Vec<usize> = choices
            .iter()
            .map(|choice| {
                self.add(
                    Node::new(&["div[role='option']"])
                        .on_page(page)
                        .text(choice)
                        .hidden()
                        .on_click(Effect::Pick(trigger)),
                )
            })
            .collect();
        self.set_on_click(trigger, Effect::Reveal(options.clone()));
        (trigger, options)
    }

    pub fn button(&self, page: usize, text: &str, effect: Effect) -> usize {
        self.add(Node::new(&["button"]).on_page(page).text(text).on_click(effect))
    }

    /// A job card on the listing, present on every page.
    pub fn job_card(&self, effect: Effect) -> usize {
        self.add(Node::new(&[".job-card-container--clickable"]).on_click(effect))
    }

    pub fn apply_button(&self, page: usize, wizard: usize) -> usize {
        self.add(
            Node::new(&[".jobs-apply-button"])
                .on_page(page)
                .text("Easy Apply")
                .on_click(Effect::GoTo(wizard)),
        )
    }

    pub fn dismiss_button(&self, page: usize, effect: Effect) -> usize {
        self.add(
            Node::new(&["button[aria-label='Dismiss']"])
                .on_page(page)
                .attr("aria-label", "Dismiss")
                .on_click(effect),
        )
    }
}

#[async_trait]
impl DocumentProvider for FakeDocument {
    type Handle = usize;

    async fn find_all(&self, selector: &Selector) -> Result<Vec<usize>> {
        let state = self.state.lock().unwrap();
        if state.disconnected {
            return Err(Error::InteractionFailed("connection closed".into()));
        }
        Ok(state.matching(selector))
    }

    async fn find_within(&self, scope: &usize, selector: &Selector) -> Result<Vec<usize>> {
        let state = self.state.lock().unwrap();
        state.live(*scope)?;
        let within = state
            .matching(selector)
            .into_iter()
            .filter(|&id| state.is_descendant(id, *scope))
            .collect();
        Ok(within)
    }

    /// Checks once; a fake document never changes on its own.
    async fn wait_until(
        &self,
        selector: &Selector,
        condition: WaitCondition,
        _timeout: Duration,
    ) -> Result<usize> {
        let state = self.state.lock().unwrap();
        let found = state.matching(selector).into_iter().find(|&id| {
            let node = &state.nodes[id];
            match condition {
                WaitCondition::Present => true,
                WaitCondition::Clickable => node.displayed && node.enabled,
            }
        });
        found.ok_or_else(|| Error::Timeout(selector.to_string()))
    }

    async fn click(&self, handle: &usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let effect = state.live(*handle)?.on_click.clone();
        state.clicks.push(*handle);
        state.apply(*handle, effect)
    }

    async fn type_text(&self, handle: &usize, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let effect = state.live(*handle)?.on_type.clone();
        state.apply(*handle, effect)?;
        state.nodes[*handle].value.push_str(text);
        Ok(())
    }

    async fn clear(&self, handle: &usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(*handle)?;
        state.nodes[*handle].value.clear();
        Ok(())
    }

    async fn select_option(&self, handle: &usize, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(*handle)?;
        let node = &mut state.nodes[*handle];
        if !node.options.iter().any(|o| o.value == value) {
            return Err(Error::InteractionFailed(format!("no option with value {value}")));
        }
        for option in &mut node.options {
            option.selected = option.value == value;
        }
        node.value = value.to_string();
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &usize) -> Result<()> {
        self.state.lock().unwrap().live(*handle)?;
        Ok(())
    }

    async fn is_selected(&self, handle: &usize) -> Result<bool> {
        Ok(self.state.lock().unwrap().live(*handle)?.selected)
    }

    async fn is_enabled(&self, handle: &usize) -> Result<bool> {
        Ok(self.state.lock().unwrap().live(*handle)?.enabled)
    }

    async fn is_displayed(&self, handle: &usize) -> Result<bool> {
        Ok(self.state.lock().unwrap().live(*handle)?.displayed)
    }

    async fn attribute(&self, handle: &usize, name: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .live(*handle)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    async fn text(&self, handle: &usize) -> Result<String> {
        Ok(self.state.lock().unwrap().live(*handle)?.text.clone())
    }

    async fn value(&self, handle: &usize) -> Result<String> {
        Ok(self.state.lock().unwrap().live(*handle)?.value.clone())
    }

    async fn options(&self, handle: &usize) -> Result<Vec<SelectOption>> {
        Ok(self.state.lock().unwrap().live(*handle)?.options.clone())
    }

    async fn associated_label(&self, handle: &usize) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().live(*handle)?.label.clone())
    }

    async fn preceding_sibling_text(&self, handle: &usize) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().live(*handle)?.preceding.clone())
    }

    async fn container_text(&self, handle: &usize) -> Result<String> {
        Ok(self.state.lock().unwrap().live(*handle)?.container.clone())
    }

    async fn checkpoint(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().checkpoints.push(name.to_string());
        Ok(())
    }
}

/// Configuration with every pause removed.
pub fn config() -> ApplyConfig {
    ApplyConfig::default()
        .identity("jane@example.com")
        .without_delays()
}
