// Content modal shown when an info prop is picked.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModalEntry {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl ModalEntry {
    fn new(title: &str, body: &str, link: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            link: link.map(str::to_string),
        }
    }
}

/// Prop name → content. Read-only after startup.
pub type ModalCatalog = BTreeMap<String, ModalEntry>;

/// Built-in content, before config overrides.
pub fn default_catalog() -> ModalCatalog {
    const LINK: Option<&str> = Some("https://example.com/");
    [
        (
            "Project_1",
            ModalEntry::new(
                "🍜Recipe Finder👩🏻‍🍳",
                "Let's get cooking! This project uses TheMealDB API for some recipes and populates my React card components. This shows my skills in working with consistent design systems using components. There is also pagination to switch pages.",
                LINK,
            ),
        ),
        (
            "Project_2",
            ModalEntry::new(
                "📋ToDo List✏️",
                "Keeping up with everything is really exhausting so I wanted to create my own ToDo list app. But I wanted my ToDo list to look like an actual ToDo list so I used Tailwind CSS for consistency and also did state management with React hooks like useState.",
                LINK,
            ),
        ),
        (
            "Project_3",
            ModalEntry::new(
                "🌞Weather App😎",
                "Rise and shine as they say (but sometimes it's not all that shiny outside). Using a location-based API the user can automatically detect their location and my application will show them the weather near them. I also put some of my design skills to use using Figma.",
                LINK,
            ),
        ),
        (
            "Chest",
            ModalEntry::new(
                "💁‍♀️ About Me",
                "Hi you found my chest👋, I'm Bella Xu and I am an aspiring creative developer and designer. I just started web development this year! In the signs, you will see some of my most recent projects that I'm proud of. I hope to add a lot more in the future. In my free time, I like to draw, watch TV shows (especially Pokémon), do clay sculpting and needle felting. Reach out if you wanna chat. Bella is OUT!!! 🏃‍♀️",
                None,
            ),
        ),
        (
            "Picnic",
            ModalEntry::new(
                "🍷 Uggh yesss 🧺",
                " Picnics are my thanggg don't @ me. Lying down with some good grape juice inna wine glass and a nice book at a park is my total vibe. If this isn't max aura points 💯 idk what is.",
                None,
            ),
        ),
    ]
    .into_iter()
    .map(|(name, entry)| (name.to_string(), entry))
    .collect()
}

pub struct ModalState {
    catalog: ModalCatalog,
    open: Option<String>,
}

impl ModalState {
    pub fn new(catalog: ModalCatalog) -> Self {
        Self { catalog, open: None }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open the modal for `name`. Returns false, leaving state untouched, if
    /// the catalog has no entry for it.
    pub fn show(&mut self, name: &str) -> bool {
        if !self.catalog.contains_key(name) {
            return false;
        }
        self.open = Some(name.to_string());
        true
    }

    pub fn dismiss(&mut self) {
        self.open = None;
    }

    /// Entry currently on screen.
    pub fn current(&self) -> Option<&ModalEntry> {
        self.open.as_ref().and_then(|name| self.catalog.get(name))
    }
}
