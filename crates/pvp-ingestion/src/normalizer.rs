//! Key spelling normalization.

use pvp_types::RawEvent;

/// Fill canonical fields from their alternate and legacy spellings.
///
/// Spellings are tried in order (canonical, alternate, legacy, legacy
/// alternate) and the first present one wins. Nothing is copied over a
/// field that is already set, and the source fields are left in place, so
/// applying this twice is a no-op.
pub fn normalize(mut event: RawEvent) -> RawEvent {
    fill(&mut event.source_type, &event.source_type_alt);

    fill(&mut event.companions, &event.companions_alt);
    fill(&mut event.companions, &event.pet_list);
    fill(&mut event.companions, &event.pet_list_alt);

    fill(&mut event.companion_talents, &event.companion_talents_alt);
    fill(&mut event.companion_talents, &event.pet_talent_list);
    fill(&mut event.companion_talents, &event.pet_talent_list_alt);

    fill(&mut event.legendary_items, &event.legendary_items_alt);
    fill(&mut event.legendary_items, &event.rune_list);
    fill(&mut event.legendary_items, &event.rune_list_alt);

    fill(&mut event.special_gear, &event.special_gear_alt);
    fill(&mut event.special_gear, &event.armor);
    event
}

fn fill<T: Clone>(canonical: &mut Option<T>, alias: &Option<T>) {
    if canonical.is_none() {
        canonical.clone_from(alias);
    }
}
