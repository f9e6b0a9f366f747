use crate::error::Result;

/// The windowing side of the loop.
pub trait EventSource {
    /// Handles every pending window event without blocking for new ones.
    fn poll_events(&mut self);

    fn close_requested(&self) -> bool;
}

/// The graphics side of the loop: draw one frame and present it.
pub trait FramePresenter {
    /// Returns `false` when no image could be presented this iteration, e.g.
    /// while the swapchain is being recreated.
    fn present_frame(&mut self) -> Result<bool>;
}

/// Polls and presents until the window asks to close. The close signal is
/// checked once per iteration, before polling, so the frame drawn in the
/// iteration that saw the request is still presented.
///
/// Returns the number of frames presented.
pub fn run<E, F>(events: &mut E, frames: &mut F) -> Result<u64>
where
    E: EventSource,
    F: FramePresenter,
{
    let mut presented = 0;
    while !events.close_requested() {
        events.poll_events();
        if frames.present_frame()? {
            presented += 1;
        }
    }
    Ok(presented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    struct ClosesAfter {
        polls: u32,
        close_at: u32,
    }

    impl EventSource for ClosesAfter {
        fn poll_events(&mut self) {
            self.polls += 1;
        }

        fn close_requested(&self) -> bool {
            self.polls >= self.close_at
        }
    }

    #[derive(Default)]
    struct CountingFrames {
        calls: u32,
        presented: u32,
        fail_at: Option<u32>,
        skip_at: Option<u32>,
    }

    impl FramePresenter for CountingFrames {
        fn present_frame(&mut self) -> Result<bool> {
            let call = self.calls;
            self.calls += 1;
            if Some(call) == self.fail_at {
                return Err(RenderError::Frame("device lost".to_owned()));
            }
            if Some(call) == self.skip_at {
                return Ok(false);
            }
            self.presented += 1;
            Ok(true)
        }
    }

    #[test]
    fn one_frame_per_poll_until_close() {
        let mut events = ClosesAfter {
            polls: 0,
            close_at: 3,
        };
        let mut frames = CountingFrames::default();

        let presented = run(&mut events, &mut frames).unwrap();
        assert_eq!(presented, 3);
        assert_eq!(frames.presented, 3);
        assert_eq!(events.polls, 3);
    }

    #[test]
    fn closed_window_presents_nothing() {
        let mut events = ClosesAfter {
            polls: 0,
            close_at: 0,
        };
        let mut frames = CountingFrames::default();

        assert_eq!(run(&mut events, &mut frames).unwrap(), 0);
        assert_eq!(events.polls, 0);
    }

    #[test]
    fn frame_error_stops_the_loop() {
        let mut events = ClosesAfter {
            polls: 0,
            close_at: 10,
        };
        let mut frames = CountingFrames {
            fail_at: Some(2),
            ..CountingFrames::default()
        };

        match run(&mut events, &mut frames) {
            Err(RenderError::Frame(_)) => {}
            other => panic!("expected a frame error, got {:?}", other),
        }
        assert_eq!(frames.presented, 2);
        assert_eq!(events.polls, 3);
    }

    #[test]
    fn skipped_frames_are_not_counted() {
        let mut events = ClosesAfter {
            polls: 0,
            close_at: 4,
        };
        let mut frames = CountingFrames {
            skip_at: Some(1),
            ..CountingFrames::default()
        };

        assert_eq!(run(&mut events, &mut frames).unwrap(), 3);
        assert_eq!(frames.calls, 4);
        assert_eq!(events.polls, 4);
    }
}
