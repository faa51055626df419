/// Effect a straight-line chunk of code has on the operand stack
///
/// `net` is the difference in stack size from before the code runs to after it finishes, counted
/// in slots (so `long` and `double` count as 2). `peak` is the largest the stack ever gets over
/// its starting size while the code runs. `peak >= max(net, 0)` always holds: the constructors
/// clamp and composition preserves it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct StackEffect {
    net: i32,
    peak: u32,
}

impl StackEffect {
    /// Effect of code that leaves the stack untouched
    pub const NONE: StackEffect = StackEffect { net: 0, peak: 0 };

    /// Effect of code that only ever grows toward its final size
    pub fn new(net: i32) -> StackEffect {
        StackEffect::with_peak(net, 0)
    }

    /// Effect with an explicit interim peak (clamped up to `max(net, 0)`)
    pub fn with_peak(net: i32, peak: u32) -> StackEffect {
        let floor = if net > 0 { net as u32 } else { 0 };
        StackEffect {
            net,
            peak: peak.max(floor),
        }
    }

    /// Net change in stack slots
    pub fn net(&self) -> i32 {
        self.net
    }

    /// Maximal interim growth in stack slots
    pub fn peak(&self) -> u32 {
        self.peak
    }

    /// Effect of running `self` then `next`
    ///
    /// Nets add. The combined peak is whichever is higher: the first code's own peak, or the
    /// second code's peak on top of the stack the first code left behind.
    pub fn then(self, next: StackEffect) -> StackEffect {
        StackEffect {
            net: self.net + next.net,
            peak: (self.peak as i32).max(self.net + next.peak as i32) as u32,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Fold a sequence of effects by simulating the stack depth directly
    fn simulate(effects: &[StackEffect]) -> StackEffect {
        let mut depth: i32 = 0;
        let mut high_water: i32 = 0;
        for effect in effects {
            high_water = high_water.max(depth + effect.peak() as i32);
            depth += effect.net();
        }
        StackEffect::with_peak(depth, high_water.max(0) as u32)
    }

    fn compose(effects: &[StackEffect]) -> StackEffect {
        effects
            .iter()
            .fold(StackEffect::NONE, |acc, effect| acc.then(*effect))
    }

    #[test]
    fn identity() {
        let push2_pop1 = StackEffect::with_peak(1, 2);
        assert_eq!(StackEffect::NONE.then(push2_pop1), push2_pop1);
        assert_eq!(push2_pop1.then(StackEffect::NONE), push2_pop1);
        assert_eq!(StackEffect::NONE.then(StackEffect::NONE), StackEffect::NONE);
    }

    #[test]
    fn peak_floor() {
        assert_eq!(StackEffect::new(3).peak(), 3);
        assert_eq!(StackEffect::new(-2).peak(), 0);
        assert_eq!(StackEffect::with_peak(-2, 1).peak(), 1);
        assert_eq!(StackEffect::with_peak(2, 1).peak(), 2);
    }

    #[test]
    fn sequencing() {
        // Push two ints, then call a (II)I method: interim growth never exceeds 2
        let push_int = StackEffect::new(1);
        let call = StackEffect::with_peak(-1, 0);
        let total = push_int.then(push_int).then(call);
        assert_eq!(total.net(), 1);
        assert_eq!(total.peak(), 2);

        // A pop before a deep push keeps the later peak from stacking on the popped slot
        let pop = StackEffect::new(-1);
        let total = push_int.then(pop).then(StackEffect::with_peak(2, 2));
        assert_eq!(total.net(), 2);
        assert_eq!(total.peak(), 2);
    }

    #[test]
    fn composition_matches_simulation() {
        let cases: &[&[StackEffect]] = &[
            &[],
            &[StackEffect::new(2)],
            &[StackEffect::new(1), StackEffect::new(-1)],
            &[
                StackEffect::with_peak(0, 3),
                StackEffect::new(-2),
                StackEffect::new(2),
            ],
            &[
                StackEffect::new(1),
                StackEffect::new(1),
                StackEffect::with_peak(-1, 1),
                StackEffect::new(-1),
            ],
        ];
        for case in cases {
            assert_eq!(compose(case), simulate(case), "effects {:?}", case);
        }
    }

    #[test]
    fn randomized_composition_matches_simulation() {
        // xorshift64, fixed seed
        let mut state: u64 = 0x243F_6A88_85A3_08D3;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for _ in 0..200 {
            let len = (next() % 12) as usize;
            let effects: Vec<StackEffect> = (0..len)
                .map(|_| {
                    let net = (next() % 9) as i32 - 4;
                    let extra = (next() % 4) as u32;
                    StackEffect::with_peak(net, net.max(0) as u32 + extra)
                })
                .collect();
            assert_eq!(
                compose(&effects),
                simulate(&effects),
                "effects {:?}",
                effects
            );
        }
    }
}
