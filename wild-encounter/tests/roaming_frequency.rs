mod common;

use common::{TestWorld, load_catalog};
use wild_encounter::{Creature, EncounterResolver, MigrationPolicy, RoamingLocation};

#[test]
fn one_in_three_roamer_appears_about_a_third_of_the_time() {
    // Map 9 has no authored groups, so only the roamer can produce encounters.
    let world = TestWorld::route_grass().at(9, "tall_grass", 0);
    let mut resolver = EncounterResolver::with_defaults(load_catalog(), 0xD1CE).unwrap();
    resolver.on_location_changed(&world);
    let home = RoamingLocation::new(9, "grass", 0);
    let policy = resolver.register_migration_policy(MigrationPolicy::fixed(home));
    resolver
        .release_roaming_creature(Creature::new("raikou", 40), 3, policy, &world)
        .unwrap();

    let trials = 1000;
    let hits = (0..trials)
        .filter(|_| resolver.is_encounter_available(&world))
        .count();
    assert!((280..=390).contains(&hits), "hits {hits}");
}

#[test]
fn roamer_elsewhere_never_appears() {
    let world = TestWorld::route_grass().at(9, "tall_grass", 0);
    let mut resolver = EncounterResolver::with_defaults(load_catalog(), 7).unwrap();
    resolver.on_location_changed(&world);
    let policy = resolver
        .register_migration_policy(MigrationPolicy::fixed(RoamingLocation::new(10, "grass", 0)));
    resolver
        .release_roaming_creature(Creature::new("raikou", 40), 1, policy, &world)
        .unwrap();
    assert!((0..200).all(|_| !resolver.is_encounter_available(&world)));
}
