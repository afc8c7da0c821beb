use crate::model::Weekday;

/// Every weekday from `start` to `end` inclusive, walking forward through the
/// week and wrapping past Sunday when `end` comes before `start`.
///
/// Never empty; the first element is always `start`.
pub fn expand_day_range(start: Weekday, end: Weekday) -> Vec<Weekday> {
    let (s, e) = (start.index(), end.index());
    if e >= s {
        Weekday::ALL[s..=e].to_vec()
    } else {
        let mut days = Weekday::ALL[s..].to_vec();
        days.extend_from_slice(&Weekday::ALL[..=e]);
        days
    }
}

/// A set of weekdays packed into seven bits (bit `i` = weekday index `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DaySet(u8);

impl DaySet {
    pub const EMPTY: DaySet = DaySet(0);
    pub const WEEK: DaySet = DaySet(0b111_1111);

    pub fn single(day: Weekday) -> Self {
        DaySet(1 << day.index())
    }

    /// The expanded day range as a set.
    pub fn range(start: Weekday, end: Weekday) -> Self {
        expand_day_range(start, end).into_iter().collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.index();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn intersects(&self, other: &DaySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(&self, other: &DaySet) -> DaySet {
        DaySet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in canonical week order (Monday first).
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        Weekday::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}
