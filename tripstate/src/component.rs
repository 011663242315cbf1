//! Components: a named render function bound to watched paths.
//!
//! A component renders its slice into a [`Region`]. Every render replaces the
//! region's markup wholesale; there is no diffing. Mounting connects the
//! component to a store and delivers the first render immediately.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use minijinja::Environment;
use tracing::{debug, warn};

use crate::core::path::Path;
use crate::core::types::Slice;
use crate::store::{StateStore, Subscription};

/// Render function over a slice.
pub type RenderFn = Box<dyn Fn(&Slice) -> Result<String>>;

/// Markup target shared between a mounted component and its owner.
#[derive(Debug, Clone, Default)]
pub struct Region {
    inner: Rc<RefCell<RegionState>>,
}

#[derive(Debug, Default)]
struct RegionState {
    markup: String,
    renders: usize,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markup(&self) -> String {
        self.inner.borrow().markup.clone()
    }

    /// Number of successful renders so far.
    pub fn render_count(&self) -> usize {
        self.inner.borrow().renders
    }

    fn replace(&self, markup: String) {
        let mut state = self.inner.borrow_mut();
        state.markup = markup;
        state.renders += 1;
    }
}

enum Renderer {
    Function(RenderFn),
    Template {
        env: Environment<'static>,
        source: String,
    },
}

impl Renderer {
    fn render(&self, slice: &Slice) -> Result<String> {
        match self {
            Renderer::Function(render) => render(slice),
            Renderer::Template { env, source } => env
                .render_str(source, slice.to_context())
                .context("render template"),
        }
    }
}

/// A render function (or template) plus the paths it depends on.
pub struct Component {
    id: String,
    watch: Vec<Path>,
    renderer: Renderer,
}

impl Component {
    pub fn builder() -> ComponentBuilder {
        ComponentBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn watched_paths(&self) -> &[Path] {
        &self.watch
    }

    /// Render `slice` without touching any store.
    pub fn render(&self, slice: &Slice) -> Result<String> {
        self.renderer
            .render(slice)
            .with_context(|| format!("component '{}'", self.id))
    }

    /// Connect to `store`, rendering into `region` on every notification, and
    /// deliver the first render right away.
    ///
    /// A failed render is logged and leaves the previous markup in place.
    pub fn mount(self, store: &mut StateStore, region: &Region) -> Subscription {
        let id = self.id.clone();
        let watch = self.watch.clone();
        let target = region.clone();
        let subscription = store.connect(
            id.clone(),
            move |slice: &Slice| match self.render(slice) {
                Ok(markup) => target.replace(markup),
                Err(err) => {
                    warn!(component = %self.id, error = %format!("{:#}", err), "render failed");
                }
            },
            watch,
        );
        debug!(component = %id, "component mounted");
        store.trigger_update(&id);
        subscription
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let renderer = match &self.renderer {
            Renderer::Function(_) => "function",
            Renderer::Template { .. } => "template",
        };
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("watch", &self.watch)
            .field("renderer", &renderer)
            .finish()
    }
}

/// Builder for [`Component`]; `id` and one of `render`/`template` are required.
#[derive(Default)]
pub struct ComponentBuilder {
    id: Option<String>,
    watch: Vec<Path>,
    renderer: Option<Renderer>,
}

impl ComponentBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn watch<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Path>,
    {
        self.watch.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Slice) -> Result<String> + 'static,
    {
        self.renderer = Some(Renderer::Function(Box::new(render)));
        self
    }

    /// Render with a minijinja template. The context is the watched slice
    /// re-nested into a document, so `{{ user.isLoggedIn }}` reads the
    /// watched path `user.isLoggedIn`.
    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.renderer = Some(Renderer::Template {
            env: Environment::new(),
            source: source.into(),
        });
        self
    }

    pub fn build(self) -> Result<Component> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| anyhow!("component requires a non-empty id"))?;
        let Some(renderer) = self.renderer else {
            bail!("component '{}' requires a render function or template", id);
        };
        if let Renderer::Template { source, .. } = &renderer {
            Environment::new()
                .template_from_str(source)
                .map(|_| ())
                .with_context(|| format!("component '{}': invalid template", id))?;
        }
        Ok(Component {
            id,
            watch: self.watch,
            renderer,
        })
    }
}
