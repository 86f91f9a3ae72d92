use std::sync::Arc;

/// Фильтр получателя: преобразовать значение или отбросить его.
///
/// `None` означает, что значение исчезает только для этого получателя;
/// остальные получатели его всё равно увидят.
pub type Filter<T> = Arc<dyn Fn(T) -> Option<T> + Send + Sync>;

/// Оборачивает замыкание в [`Filter`].
pub fn filter_fn<T, F>(f: F) -> Filter<T>
where
    F: Fn(T) -> Option<T> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Фильтр, который не пропускает ничего.
pub fn discard_all<T>() -> Filter<T> {
    Arc::new(|_| None)
}

/// Упорядоченная цепочка фильтров одного получателя.
///
/// Фильтры применяются в порядке регистрации; первый `None`
/// обрывает цепочку, и значение до получателя не доходит.
pub struct FilterChain<T> {
    filters: Vec<Filter<T>>,
}

impl<T> FilterChain<T> {
    /// Пустая цепочка: значения проходят без изменений.
    pub fn none() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn push(&mut self, filter: Filter<T>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Прогоняет значение через всю цепочку.
    pub fn apply(&self, value: T) -> Option<T> {
        let mut current = value;
        for filter in &self.filters {
            match filter(current) {
                Some(next) => current = next,
                None => return None,
            }
        }
        Some(current)
    }
}

impl<T> Default for FilterChain<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> Clone for FilterChain<T> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<T> From<Vec<Filter<T>>> for FilterChain<T> {
    fn from(filters: Vec<Filter<T>>) -> Self {
        Self { filters }
    }
}

impl<T> From<Filter<T>> for FilterChain<T> {
    fn from(filter: Filter<T>) -> Self {
        Self {
            filters: vec![filter],
        }
    }
}

impl<T> FromIterator<Filter<T>> for FilterChain<T> {
    fn from_iter<I: IntoIterator<Item = Filter<T>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
