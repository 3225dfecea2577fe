use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::repo_types::{Food, FoodCategory};

/// Arena view over the category tree and the foods filed under it.
///
/// Ancestry and descendants are resolved by id lookups, so broken or cyclic
/// parent chains never loop.
pub struct CategoryTree<'a> {
    categories: HashMap<Uuid, &'a FoodCategory>,
    children: HashMap<Uuid, Vec<Uuid>>,
    foods_by_category: HashMap<Uuid, Vec<&'a Food>>,
}

impl<'a> CategoryTree<'a> {
    pub fn new(categories: &'a [FoodCategory], foods: &'a [Food]) -> Self {
        let mut by_id = HashMap::with_capacity(categories.len());
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for c in categories {
            by_id.insert(c.id, c);
            if let Some(parent) = c.parent_id {
                children.entry(parent).or_default().push(c.id);
            }
        }

        let mut foods_by_category: HashMap<Uuid, Vec<&Food>> = HashMap::new();
        for f in foods {
            if let Some(cat) = f.food_category_id {
                foods_by_category.entry(cat).or_default().push(f);
            }
        }

        Self {
            categories: by_id,
            children,
            foods_by_category,
        }
    }

    pub fn parent_of(&self, category_id: Uuid) -> Option<Uuid> {
        self.categories.get(&category_id).and_then(|c| c.parent_id)
    }

    /// Walks parent references up to the root. On a dangling parent id or a
    /// cycle the deepest node reached so far is returned.
    pub fn root_of(&self, category_id: Uuid) -> Uuid {
        let mut current = category_id;
        let mut seen = HashSet::from([current]);
        while let Some(parent) = self.parent_of(current) {
            if !self.categories.contains_key(&parent) || !seen.insert(parent) {
                tracing::warn!(%category_id, %current, %parent, "broken category chain");
                break;
            }
            current = parent;
        }
        current
    }

    /// Foods owned by `category_id` or any of its descendants.
    pub fn foods_under(&self, category_id: Uuid) -> Vec<&'a Food> {
        let mut out = Vec::new();
        let mut stack = vec![category_id];
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(foods) = self.foods_by_category.get(&id) {
                out.extend(foods.iter().copied());
            }
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
        out
    }
}
