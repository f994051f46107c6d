//! Stat derivation and damage
//!
//! A `StatInstance` is one combatant's use of one move against one of its
//! own stats. Its value is derived once from base stat, effort value and two
//! random factors, then scaled by the move's stage change every time the move
//! is used. The scaling compounds and is never reset.

use rand::Rng;

use super::error::CombatError;

/// Every combatant fights at level 1
pub const LEVEL: i64 = 1;

/// Multipliers for stage drops, index 0 = stage -1
pub const STAGE_DROPS: [f64; 6] = [0.667, 0.5, 0.4, 0.333, 0.285, 0.25];

/// Base value used when a move resolves to no particular stat
pub const GENERIC_BASE_VALUE: f64 = 1.0;

/// Effort value used when a move resolves to no particular stat
pub const GENERIC_EFFORT_VALUE: i64 = 1;

/// A move as used in battle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub name: String,
    /// `None` for status moves, which never deal damage
    pub power: Option<i64>,
    pub stage_change: i32,
}

impl Move {
    pub fn new(name: &str, power: Option<i64>, stage_change: i32) -> Self {
        Self {
            name: name.to_string(),
            power,
            stage_change,
        }
    }
}

/// Derive a stat value before any stage change
///
/// The level product is floor-divided by 100 before adding 5, so at level 1
/// the first term is 0 for any ordinary base stat.
pub fn derive_stat(base: f64, individual: f64, effort: i64, level: i64, nature: f64) -> f64 {
    let raw = (2.0 * base + individual + effort.div_euclid(4) as f64) * level as f64;
    ((raw / 100.0).floor() + 5.0) * nature
}

/// Multiplier applied for a stage change
pub fn stage_multiplier(stage: i32) -> f64 {
    match stage {
        0 => 1.0,
        s if s > 0 => 1.0 + 0.5 * f64::from(s.min(6)),
        s => STAGE_DROPS[(s.unsigned_abs().min(6) - 1) as usize],
    }
}

/// A combatant's stat as bound to one move
#[derive(Debug, Clone)]
pub struct StatInstance {
    /// Stat the move resolved against, if any
    pub stat_type: Option<String>,
    /// Current value, mutated by every use of the move
    pub stat_value: f64,
    pub effort_value: i64,
    /// Drawn from [0, 15) at creation
    pub individual_value: f64,
    pub level: i64,
    /// Drawn from [0.85, 1.0) at creation
    pub nature_modifier: f64,
    pub move_: Move,
    /// Name of the owning combatant
    pub owner: String,
}

impl StatInstance {
    /// Create an instance, drawing individual value and nature from `rng`
    pub fn new<R: Rng + ?Sized>(
        owner: &str,
        stat_type: Option<String>,
        base_value: f64,
        effort_value: i64,
        move_: Move,
        rng: &mut R,
    ) -> Self {
        let individual_value = rng.random_range(0.0..15.0);
        let nature_modifier = rng.random_range(0.85..1.0);
        Self::with_factors(
            owner,
            stat_type,
            base_value,
            effort_value,
            move_,
            individual_value,
            nature_modifier,
        )
    }

    /// Create an instance with fixed random factors
    ///
    /// Without a stat type the base value is kept as is.
    pub fn with_factors(
        owner: &str,
        stat_type: Option<String>,
        base_value: f64,
        effort_value: i64,
        move_: Move,
        individual_value: f64,
        nature_modifier: f64,
    ) -> Self {
        let stat_value = if stat_type.is_some() {
            derive_stat(
                base_value,
                individual_value,
                effort_value,
                LEVEL,
                nature_modifier,
            )
        } else {
            base_value
        };

        Self {
            stat_type,
            stat_value,
            effort_value,
            individual_value,
            level: LEVEL,
            nature_modifier,
            move_,
            owner: owner.to_string(),
        }
    }

    /// Name of the bound move
    pub fn move_name(&self) -> &str {
        &self.move_.name
    }

    /// Scale the stat value by the move's stage change
    pub fn apply_stage_change(&mut self) {
        self.stat_value *= stage_multiplier(self.move_.stage_change);
    }

    /// Damage this instance deals to `defender`
    ///
    /// Both sides have their stage change applied first, even when the move
    /// turns out to be a status move.
    pub fn damage_against<R: Rng + ?Sized>(
        &mut self,
        defender: &mut StatInstance,
        rng: &mut R,
    ) -> Result<f64, CombatError> {
        self.apply_stage_change();
        defender.apply_stage_change();

        let Some(power) = self.move_.power else {
            return Ok(0.0);
        };

        if defender.stat_value == 0.0 {
            return Err(self.degenerate());
        }

        let level_factor = 2.0 * self.level as f64 / 5.0 + 2.0;
        let base = (level_factor * power as f64 * self.stat_value / defender.stat_value) / 50.0 + 2.0;
        let damage = base * rng.random_range(0.85..1.0);

        if !damage.is_finite() {
            return Err(self.degenerate());
        }
        Ok(damage)
    }

    fn degenerate(&self) -> CombatError {
        CombatError::DegenerateStat {
            combatant: self.owner.clone(),
            move_name: self.move_.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn instance(stat: Option<&str>, base: f64, stage: i32, power: Option<i64>) -> StatInstance {
        StatInstance::with_factors(
            "bulbasaur",
            stat.map(str::to_string),
            base,
            0,
            Move::new("test-move", power, stage),
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_derive_stat_floors() {
        // floor((2*45 + 0 + 0) / 100) + 5 = 5
        assert!(approx(derive_stat(45.0, 0.0, 0, 1, 1.0), 5.0));
        // floor((200 + 63) / 100) + 5 = 7
        assert!(approx(derive_stat(100.0, 0.0, 252, 1, 1.0), 7.0));
        // effort is floored by 4 before the sum is floored by 100
        assert!(approx(derive_stat(49.0, 0.0, 7, 1, 1.0), 5.0));
        assert!(approx(derive_stat(49.0, 0.0, 8, 1, 1.0), 6.0));
    }

    #[test]
    fn test_derive_stat_nature() {
        assert!(approx(derive_stat(45.0, 14.9, 0, 1, 0.9), 5.4));
        assert!(approx(derive_stat(45.0, 9.0, 0, 1, 0.9), 4.5));
    }

    #[test]
    fn test_generic_instance_keeps_base() {
        let inst = instance(None, GENERIC_BASE_VALUE, 0, Some(40));
        assert!(approx(inst.stat_value, 1.0));
        assert_eq!(inst.level, 1);
    }

    #[test]
    fn test_stage_multipliers() {
        assert!(approx(stage_multiplier(0), 1.0));
        assert!(approx(stage_multiplier(1), 1.5));
        assert!(approx(stage_multiplier(2), 2.0));
        assert!(approx(stage_multiplier(6), 4.0));
        assert!(approx(stage_multiplier(-1), 0.667));
        assert!(approx(stage_multiplier(-2), 0.5));
        assert!(approx(stage_multiplier(-3), 0.4));
        assert!(approx(stage_multiplier(-4), 0.333));
        assert!(approx(stage_multiplier(-5), 0.285));
        assert!(approx(stage_multiplier(-6), 0.25));
    }

    #[test]
    fn test_stage_change_compounds() {
        let mut inst = instance(Some("attack"), 100.0, 2, None);
        let start = inst.stat_value;

        inst.apply_stage_change();
        assert!(approx(inst.stat_value, start * 2.0));
        inst.apply_stage_change();
        assert!(approx(inst.stat_value, start * 4.0));
    }

    #[test]
    fn test_status_move_deals_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut attacker = instance(Some("attack"), 80.0, -1, None);
        let mut defender = instance(None, 0.0, 0, None);

        let damage = attacker.damage_against(&mut defender, &mut rng).unwrap();
        assert_eq!(damage, 0.0);
    }

    #[test]
    fn test_damage_applies_both_stage_changes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut attacker = instance(Some("attack"), 100.0, 1, None);
        let mut defender = instance(Some("defense"), 100.0, -2, None);
        let (atk, def) = (attacker.stat_value, defender.stat_value);

        attacker.damage_against(&mut defender, &mut rng).unwrap();
        assert!(approx(attacker.stat_value, atk * 1.5));
        assert!(approx(defender.stat_value, def * 0.5));
    }

    #[test]
    fn test_damage_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mut attacker = instance(None, 1.0, 0, Some(40));
            let mut defender = instance(None, 1.0, 0, None);

            // (2.4 * 40 * 1 / 1) / 50 + 2 = 3.92
            let damage = attacker.damage_against(&mut defender, &mut rng).unwrap();
            assert!(damage >= 3.92 * 0.85 - 1e-9, "damage {} too low", damage);
            assert!(damage <= 3.92 + 1e-9, "damage {} too high", damage);
        }
    }

    #[test]
    fn test_zero_defense_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut attacker = instance(None, 1.0, 0, Some(40));
        let mut defender = instance(None, 0.0, 0, None);

        let err = attacker.damage_against(&mut defender, &mut rng).unwrap_err();
        assert!(matches!(err, CombatError::DegenerateStat { .. }));
    }

    #[test]
    fn test_infinite_ratio_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut attacker = instance(None, f64::INFINITY, 0, Some(40));
        let mut defender = instance(None, f64::INFINITY, 0, None);

        let err = attacker.damage_against(&mut defender, &mut rng).unwrap_err();
        assert!(matches!(err, CombatError::DegenerateStat { .. }));
    }

    #[test]
    fn test_random_factors_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let inst = StatInstance::new(
                "pikachu",
                Some("speed".to_string()),
                90.0,
                2,
                Move::new("agility", None, 2),
                &mut rng,
            );
            assert!((0.0..15.0).contains(&inst.individual_value));
            assert!((0.85..1.0).contains(&inst.nature_modifier));
        }
    }
}
