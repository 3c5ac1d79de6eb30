//! Annotation state machine for a single image.
//!
//! A session starts in rectangle mode. Dragging in the image sets the face
//! box, after which every click records the next landmark, cycling through
//! 1..=68. Reset controls clear a slot and jump the cursor to it. The session
//! ends with Done, Skip or the quit key.

use crate::landmarks::{LandmarkIndex, LandmarkSet, Point, Slot};

pub const DEFAULT_QUIT_KEY: char = 'q';

/// Which slot the next pointer input targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Rect,
    Point(LandmarkIndex),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped,
    Aborted,
}

/// Input from the host toolkit.
///
/// Pointer positions are in image pixels; `None` means the pointer is outside
/// the image area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    PointerDown(Option<Point>),
    PointerMove(Option<Point>),
    PointerUp(Option<Point>),
    Reset(Slot),
    Done,
    Skip,
    Key(char),
}

/// Result of feeding one input to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// Landmarks or cursor changed; overlays need a redraw.
    Changed,
    Finished(Outcome),
}

#[derive(Clone, Debug)]
pub struct Session {
    landmarks: LandmarkSet,
    target: Target,
    dragging_rect: bool,
    outcome: Option<Outcome>,
    quit_key: char,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_quit_key(DEFAULT_QUIT_KEY)
    }

    pub fn with_quit_key(quit_key: char) -> Self {
        Self {
            landmarks: LandmarkSet::new(),
            target: Target::Rect,
            dragging_rect: false,
            outcome: None,
            quit_key,
        }
    }

    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// True between pointer-down and pointer-up in rectangle mode.
    pub fn is_dragging_rect(&self) -> bool {
        self.dragging_rect
    }

    pub fn handle(&mut self, input: Input) -> Transition {
        if self.outcome.is_some() {
            return Transition::Ignored;
        }
        match input {
            Input::PointerDown(Some(p)) => self.pointer_down(p),
            Input::PointerMove(Some(p)) => self.pointer_move(p),
            Input::PointerUp(Some(p)) => self.pointer_up(p),
            Input::PointerDown(None) | Input::PointerMove(None) | Input::PointerUp(None) => {
                Transition::Ignored
            }
            Input::Reset(slot) => self.reset(slot),
            Input::Done => self.finish(Outcome::Completed),
            Input::Skip => self.finish(Outcome::Skipped),
            Input::Key(c) if c.eq_ignore_ascii_case(&self.quit_key) => {
                self.finish(Outcome::Aborted)
            }
            Input::Key(_) => Transition::Ignored,
        }
    }

    fn pointer_down(&mut self, p: Point) -> Transition {
        match self.target {
            Target::Rect => {
                self.landmarks.rect_mut().a = p;
                self.dragging_rect = true;
            }
            Target::Point(k) => {
                self.landmarks.set_point(k, p);
                self.target = Target::Point(k.next());
            }
        }
        Transition::Changed
    }

    fn pointer_move(&mut self, p: Point) -> Transition {
        if self.target != Target::Rect || !self.dragging_rect {
            return Transition::Ignored;
        }
        self.landmarks.rect_mut().b = p;
        Transition::Changed
    }

    fn pointer_up(&mut self, p: Point) -> Transition {
        if self.target != Target::Rect {
            return Transition::Ignored;
        }
        self.landmarks.rect_mut().b = p;
        self.dragging_rect = false;
        self.target = Target::Point(LandmarkIndex::FIRST);
        let rect = self.landmarks.rect();
        if rect.is_degenerate() {
            log::warn!("face rectangle {} - {} has zero area", rect.a, rect.b);
        } else {
            log::debug!("rectangle committed: {rect:?}");
        }
        Transition::Changed
    }

    fn reset(&mut self, slot: Slot) -> Transition {
        self.dragging_rect = false;
        match slot {
            Slot::Rect => {
                self.landmarks.reset_rect();
                self.target = Target::Rect;
            }
            Slot::Landmark(k) => {
                self.landmarks.clear_point(k);
                self.target = Target::Point(k);
            }
        }
        Transition::Changed
    }

    fn finish(&mut self, outcome: Outcome) -> Transition {
        self.dragging_rect = false;
        self.outcome = Some(outcome);
        Transition::Finished(outcome)
    }

    /// Label of the reset control for `slot`.
    pub fn slot_label(&self, slot: Slot) -> String {
        match slot {
            Slot::Rect if self.target == Target::Rect => "Rect?".to_string(),
            Slot::Rect => "Rect".to_string(),
            Slot::Landmark(k) if self.landmarks.is_set(k) => k.to_string(),
            Slot::Landmark(k) => format!("{k}?"),
        }
    }

    pub fn is_current(&self, slot: Slot) -> bool {
        match (slot, self.target) {
            (Slot::Rect, Target::Rect) => true,
            (Slot::Landmark(a), Target::Point(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(i: usize) -> LandmarkIndex {
        LandmarkIndex::new(i).unwrap()
    }

    fn drag_rect(s: &mut Session, a: Point, b: Point) {
        s.handle(Input::PointerDown(Some(a)));
        s.handle(Input::PointerMove(Some(b)));
        s.handle(Input::PointerUp(Some(b)));
    }

    #[test]
    fn starts_in_rect_mode() {
        let s = Session::new();
        assert_eq!(s.target(), Target::Rect);
        assert_eq!(s.outcome(), None);
        assert_eq!(s.slot_label(Slot::Rect), "Rect?");
    }

    #[test]
    fn rect_drag_sets_corners_and_moves_to_first_point() {
        let mut s = Session::new();
        assert_eq!(
            s.handle(Input::PointerDown(Some(Point::new(10, 10)))),
            Transition::Changed
        );
        assert!(s.is_dragging_rect());
        s.handle(Input::PointerMove(Some(Point::new(30, 40))));
        assert_eq!(s.landmarks().rect().b, Point::new(30, 40));
        assert_eq!(s.target(), Target::Rect);

        s.handle(Input::PointerUp(Some(Point::new(50, 60))));
        assert_eq!(s.landmarks().rect().a, Point::new(10, 10));
        assert_eq!(s.landmarks().rect().b, Point::new(50, 60));
        assert_eq!(s.target(), Target::Point(k(1)));
        assert_eq!(s.slot_label(Slot::Rect), "Rect");
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut s = Session::new();
        assert_eq!(
            s.handle(Input::PointerMove(Some(Point::new(5, 5)))),
            Transition::Ignored
        );
        assert_eq!(s.landmarks().rect().b, Point::ORIGIN);
    }

    #[test]
    fn out_of_canvas_events_are_ignored() {
        let mut s = Session::new();
        for input in [
            Input::PointerDown(None),
            Input::PointerMove(None),
            Input::PointerUp(None),
        ] {
            assert_eq!(s.handle(input), Transition::Ignored);
        }
        assert_eq!(s.target(), Target::Rect);

        drag_rect(&mut s, Point::new(1, 1), Point::new(2, 2));
        s.handle(Input::PointerDown(None));
        assert_eq!(s.target(), Target::Point(k(1)));
        assert_eq!(s.landmarks().set_count(), 0);
    }

    #[test]
    fn click_records_point_and_advances() {
        let mut s = Session::new();
        drag_rect(&mut s, Point::new(0, 0), Point::new(9, 9));
        s.handle(Input::PointerDown(Some(Point::new(20, 20))));
        assert_eq!(s.landmarks().point(k(1)), Some(Point::new(20, 20)));
        assert_eq!(s.target(), Target::Point(k(2)));
        assert_eq!(s.slot_label(Slot::Landmark(k(1))), "1");
        assert_eq!(s.slot_label(Slot::Landmark(k(2))), "2?");
    }

    #[test]
    fn pointer_up_in_point_mode_does_nothing() {
        let mut s = Session::new();
        drag_rect(&mut s, Point::new(0, 0), Point::new(9, 9));
        assert_eq!(
            s.handle(Input::PointerUp(Some(Point::new(3, 3)))),
            Transition::Ignored
        );
        assert_eq!(s.target(), Target::Point(k(1)));
    }

    #[test]
    fn cursor_wraps_after_68_clicks() {
        let mut s = Session::new();
        drag_rect(&mut s, Point::new(0, 0), Point::new(9, 9));
        for i in 0..68 {
            s.handle(Input::PointerDown(Some(Point::new(i, i))));
        }
        assert_eq!(s.target(), Target::Point(k(1)));
        assert_eq!(s.landmarks().set_count(), 68);
    }

    #[test]
    fn reset_clears_only_that_point() {
        let mut s = Session::new();
        drag_rect(&mut s, Point::new(0, 0), Point::new(9, 9));
        for i in 0..5 {
            s.handle(Input::PointerDown(Some(Point::new(i, i))));
        }
        s.handle(Input::Reset(Slot::Landmark(k(3))));
        assert_eq!(s.target(), Target::Point(k(3)));
        assert!(!s.landmarks().is_set(k(3)));
        for i in [1, 2, 4, 5] {
            assert!(s.landmarks().is_set(k(i)));
        }
        assert!(s.is_current(Slot::Landmark(k(3))));

        s.handle(Input::PointerDown(Some(Point::new(7, 8))));
        assert_eq!(s.landmarks().point(k(3)), Some(Point::new(7, 8)));
        assert_eq!(s.target(), Target::Point(k(4)));
    }

    #[test]
    fn reset_rect_returns_to_rect_mode() {
        let mut s = Session::new();
        drag_rect(&mut s, Point::new(10, 10), Point::new(50, 60));
        s.handle(Input::PointerDown(Some(Point::new(20, 20))));
        s.handle(Input::Reset(Slot::Rect));
        assert_eq!(s.target(), Target::Rect);
        assert_eq!(s.landmarks().rect().a, Point::ORIGIN);
        assert_eq!(s.landmarks().rect().b, Point::ORIGIN);
        assert!(s.landmarks().is_set(k(1)));
        assert!(s.is_current(Slot::Rect));
    }

    #[test]
    fn quit_key_aborts() {
        let mut s = Session::new();
        assert_eq!(s.handle(Input::Key('x')), Transition::Ignored);
        assert_eq!(
            s.handle(Input::Key('q')),
            Transition::Finished(Outcome::Aborted)
        );
        assert_eq!(s.outcome(), Some(Outcome::Aborted));
    }

    #[test]
    fn custom_quit_key() {
        let mut s = Session::with_quit_key('x');
        assert_eq!(s.handle(Input::Key('q')), Transition::Ignored);
        assert_eq!(
            s.handle(Input::Key('X')),
            Transition::Finished(Outcome::Aborted)
        );
    }

    #[test]
    fn finished_session_ignores_input() {
        let mut s = Session::new();
        assert_eq!(s.handle(Input::Skip), Transition::Finished(Outcome::Skipped));
        assert_eq!(s.handle(Input::Done), Transition::Ignored);
        assert_eq!(
            s.handle(Input::PointerDown(Some(Point::new(1, 1)))),
            Transition::Ignored
        );
        assert_eq!(s.outcome(), Some(Outcome::Skipped));
    }
}
