use std::cmp::Ordering;

/// Двоичная мин-куча с индексами.
///
/// Ключами служат плотные индексы тайлов, поэтому позиция каждого ключа в куче хранится
/// в векторе, и приоритет уже вставленного ключа можно изменить за O(log n).
/// Порядок задаётся компаратором, на вершине наименьший по нему элемент.
pub struct IndexedHeap<P, C> {
    entries: Vec<(usize, P)>,
    positions: Vec<Option<usize>>,
    compare: C,
}

impl<P, C> IndexedHeap<P, C>
where
    C: Fn(&P, &P) -> Ordering,
{
    /// `capacity`: ожидаемое число различных ключей; больший ключ расширит таблицу позиций
    #[must_use]
    pub fn new(capacity: usize, compare: C) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
            compare,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: usize) -> bool {
        self.positions.get(key).is_some_and(Option::is_some)
    }

    /// Приоритет ключа, если он в куче
    #[must_use]
    pub fn priority(&self, key: usize) -> Option<&P> {
        let position = (*self.positions.get(key)?)?;
        Some(&self.entries[position].1)
    }

    #[must_use]
    pub fn peek(&self) -> Option<(usize, &P)> {
        self.entries.first().map(|(key, priority)| (*key, priority))
    }

    /// Добавляет ключ; если он уже есть, меняет его приоритет
    pub fn insert(&mut self, key: usize, priority: P) {
        if self.contains(key) {
            self.update(key, priority);
            return;
        }
        if key >= self.positions.len() {
            self.positions.resize(key + 1, None);
        }
        self.entries.push((key, priority));
        let last = self.entries.len() - 1;
        self.positions[key] = Some(last);
        self.sift_up(last);
    }

    /// Меняет приоритет ключа в любую сторону. Возвращает `false`, если ключа нет
    pub fn update(&mut self, key: usize, priority: P) -> bool {
        let Some(position) = self.positions.get(key).copied().flatten() else {
            return false;
        };
        self.entries[position].1 = priority;
        let position = self.sift_up(position);
        self.sift_down(position);
        true
    }

    /// Извлекает наименьший элемент
    pub fn pop(&mut self) -> Option<(usize, P)> {
        if self.entries.is_empty() {
            return None;
        }
        let (key, priority) = self.entries.swap_remove(0);
        self.positions[key] = None;
        if let Some(&(moved, _)) = self.entries.first() {
            self.positions[moved] = Some(0);
            self.sift_down(0);
        }
        Some((key, priority))
    }

    pub fn clear(&mut self) {
        for (key, _) in self.entries.drain(..) {
            self.positions[key] = None;
        }
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.entries[a].1, &self.entries[b].1) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.positions[self.entries[a].0] = Some(a);
        self.positions[self.entries[b].0] = Some(b);
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.less(position, parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut smallest = position;
            if left < self.entries.len() && self.less(left, smallest) {
                smallest = left;
            }
            if right < self.entries.len() && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == position {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }
}
