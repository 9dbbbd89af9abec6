use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

/// Segmented `YYYY-MM-DD` entry for an optional date. Typing a full segment commits it;
/// invalid segments are dropped and the previous value kept.
pub struct DateInputState {
    pub date: Option<NaiveDate>,
    pub editing: bool,
    pub date_part: DatePart,
    pub current_date_input: String,
    /// Seed used when editing starts on an empty date.
    base: NaiveDate,
}

impl DateInputState {
    pub fn new(date: Option<NaiveDate>, base: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Year,
            current_date_input: String::new(),
            base,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.editing {
            self.date_part = DatePart::Year;
            self.current_date_input.clear();
        }
    }

    pub fn clear(&mut self) {
        self.date = None;
        self.current_date_input.clear();
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        };
        self.current_date_input.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        };
        self.current_date_input.clear();
    }

    /// Returns true when the date value changed.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        if !self.editing {
            return false;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.current_date_input.push(c);
                let width = if self.date_part == DatePart::Year { 4 } else { 2 };
                if self.current_date_input.len() < width {
                    return false;
                }
                let committed = self.commit_segment();
                self.current_date_input.clear();
                if committed {
                    self.next_date_part();
                }
                committed
            }
            KeyCode::Backspace => {
                self.current_date_input.pop();
                false
            }
            KeyCode::Right => {
                self.next_date_part();
                false
            }
            KeyCode::Left => {
                self.previous_date_part();
                false
            }
            KeyCode::Delete => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    fn commit_segment(&mut self) -> bool {
        let current = self.date.unwrap_or(self.base);
        let (year, month, day) = (current.year(), current.month(), current.day());
        let Ok(value) = self.current_date_input.parse::<u32>() else {
            return false;
        };
        let candidate = match self.date_part {
            DatePart::Year if (1900..=2100).contains(&value) => {
                let year = value as i32;
                NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
            }
            DatePart::Month if (1..=12).contains(&value) => {
                NaiveDate::from_ymd_opt(year, value, day.min(days_in_month(year, value)))
            }
            DatePart::Day if value >= 1 && value <= days_in_month(year, month) => {
                NaiveDate::from_ymd_opt(year, month, value)
            }
            _ => None,
        };
        match candidate {
            Some(date) => {
                self.date = Some(date);
                true
            }
            None => false,
        }
    }

    pub fn get_display_string(&self) -> String {
        let Some(date) = self.date.or(self.editing.then_some(self.base)) else {
            return "Not set".to_string();
        };
        let (year, month, day) = (
            format!("{:04}", date.year()),
            format!("{:02}", date.month()),
            format!("{:02}", date.day()),
        );
        if !self.editing {
            return format!("{}-{}-{}", year, month, day);
        }
        let current_input = if !self.current_date_input.is_empty() {
            format!("[{}]", self.current_date_input)
        } else {
            match self.date_part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        };
        match self.date_part {
            DatePart::Year => format!("{}{}-{}-{}", year, current_input, month, day),
            DatePart::Month => format!("{}-{}{}-{}", year, month, current_input, day),
            DatePart::Day => format!("{}-{}-{}{}", year, month, day, current_input),
        }
    }
}

// Helper function to get the number of days in a month
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 31).unwrap()
    }

    fn type_digits(state: &mut DateInputState, digits: &str) {
        for c in digits.chars() {
            state.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_all_segments_sets_the_date() {
        let mut input = DateInputState::new(None, base());
        input.toggle_editing();
        type_digits(&mut input, "19900615");
        assert_eq!(input.date, NaiveDate::from_ymd_opt(1990, 6, 15));
        assert_eq!(input.date_part, DatePart::Year);
    }

    #[test]
    fn month_change_clamps_the_day() {
        let mut input = DateInputState::new(Some(base()), base());
        input.toggle_editing();
        input.next_date_part();
        type_digits(&mut input, "02");
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2000, 2, 29));
    }

    #[test]
    fn invalid_segments_keep_the_old_value() {
        let mut input = DateInputState::new(Some(base()), base());
        input.toggle_editing();
        input.next_date_part();
        type_digits(&mut input, "13");
        assert_eq!(input.date, Some(base()));
        assert_eq!(input.date_part, DatePart::Month);
    }

    #[test]
    fn empty_date_displays_as_not_set() {
        let mut input = DateInputState::new(Some(base()), base());
        input.editing = true;
        input.handle_input(KeyCode::Delete);
        input.editing = false;
        assert_eq!(input.get_display_string(), "Not set");
    }
}
