// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use actorlink_vm_actor_interface::eam::RawAddress;
use actorlink_vm_core::Host;

use crate::{ResolveError, Resolver};

/// Turn ID-masked addresses into the canonical address of the same actor, where there is one.
///
/// The output of normalization is either an address that isn't a masked ID, or a masked ID
/// the authority couldn't map, so normalizing twice is the same as normalizing once.
pub struct Normalizer<'h, H> {
    resolver: Resolver<'h, H>,
}

impl<'h, H> Normalizer<'h, H>
where
    H: Host,
{
    pub fn new(host: &'h H) -> Self {
        Self {
            resolver: Resolver::new(host),
        }
    }

    pub fn resolver(&self) -> &Resolver<'h, H> {
        &self.resolver
    }

    /// Best effort normalization.
    ///
    /// Actors which never had a delegated address are only reachable through their ID,
    /// so an ID we can't map is returned as-is rather than rejected.
    pub fn normalize(&self, addr: &RawAddress) -> RawAddress {
        match self.must_normalize(addr) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::debug!(%addr, error = %e, "keeping address in ID form");
                *addr
            }
        }
    }

    /// Strict normalization: an ID-masked address that cannot be mapped is an error.
    pub fn must_normalize(&self, addr: &RawAddress) -> Result<RawAddress, ResolveError> {
        match addr.as_id() {
            None => Ok(*addr),
            Some(id) => self.resolver.id_to_canonical(id).map(RawAddress::from),
        }
    }

    /// Check whether two addresses denote the same actor as far as identity-keyed storage goes.
    pub fn same_actor(&self, a: &RawAddress, b: &RawAddress) -> bool {
        a == b || self.normalize(a) == self.normalize(b)
    }
}

#[cfg(test)]
mod tests {
    use actorlink_testing::mock::MockHost;
    use actorlink_vm_actor_interface::eam::{decode, encode, RawAddress};
    use actorlink_vm_actor_interface::precompiles::LOOKUP_DELEGATED_ADDRESS;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::ActorID;
    use quickcheck_macros::quickcheck;

    use super::Normalizer;
    use crate::ResolveError;

    const ETH: RawAddress = RawAddress([0x52; 20]);

    fn host(delegated: Vec<(ActorID, RawAddress)>) -> MockHost {
        delegated.into_iter().fold(
            MockHost::new(RawAddress([0xaa; 20]), TokenAmount::from_atto(0)),
            |host, (id, addr)| host.with_delegated(id, addr),
        )
    }

    /// Only canonical addresses can be registered with the EAM.
    fn registry(entries: Vec<(ActorID, RawAddress)>) -> Vec<(ActorID, RawAddress)> {
        entries
            .into_iter()
            .filter(|(_, addr)| !addr.is_id())
            .collect()
    }

    #[quickcheck]
    fn prop_non_id_unchanged(addr: RawAddress) -> bool {
        if addr.is_id() {
            return true;
        }
        let host = host(Vec::new());
        let n = Normalizer::new(&host);
        decode(&addr).is_none()
            && n.normalize(&addr) == addr
            && n.must_normalize(&addr) == Ok(addr)
            && host.call_count() == 0
    }

    #[quickcheck]
    fn prop_idempotent(addr: RawAddress, entries: Vec<(ActorID, RawAddress)>, known: bool) -> bool {
        let mut entries = registry(entries);
        // Make sure we hit the happy path often enough.
        if let (Some(id), true) = (addr.as_id(), known) {
            entries.push((id, ETH));
        }
        let host = host(entries);
        let n = Normalizer::new(&host);
        let once = n.normalize(&addr);
        n.normalize(&once) == once
    }

    #[quickcheck]
    fn prop_same_actor_reflexive(addr: RawAddress) -> bool {
        let host = host(Vec::new());
        Normalizer::new(&host).same_actor(&addr, &addr)
    }

    #[test]
    fn id_without_delegated_address() {
        let host = host(Vec::new());
        let n = Normalizer::new(&host);
        let addr = encode(1001);

        assert_eq!(n.normalize(&addr), addr);
        assert_eq!(
            n.must_normalize(&addr),
            Err(ResolveError::NoDelegatedAddress(1001))
        );
    }

    #[test]
    fn id_with_delegated_address() {
        let host = host(vec![(1001, ETH)]);
        let n = Normalizer::new(&host);
        let addr = encode(1001);

        let c = n.normalize(&addr);
        assert_eq!(c, ETH);
        assert_eq!(decode(&c), None);
        assert_eq!(n.must_normalize(&addr), Ok(ETH));
        assert!(n.same_actor(&addr, &ETH));
        assert!(!n.same_actor(&encode(1002), &ETH));
    }

    #[test]
    fn id_zero_is_resolved_like_any_other() {
        let host = host(vec![(0, ETH)]);
        assert_eq!(Normalizer::new(&host).normalize(&encode(0)), ETH);
    }

    #[test]
    fn malformed_lookup_keeps_id() {
        let tagged = ETH.to_tagged();
        let host = host(vec![(1001, ETH)])
            .with_reply(LOOKUP_DELEGATED_ADDRESS, Ok(tagged[..21].to_vec()));
        let n = Normalizer::new(&host);
        let addr = encode(1001);

        assert_eq!(n.normalize(&addr), addr);
        assert!(matches!(
            n.must_normalize(&addr),
            Err(ResolveError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn lying_authority_cannot_break_idempotence() {
        // An authority mapping one ID onto another masked ID is rejected outright.
        let host = host(Vec::new()).with_reply(
            LOOKUP_DELEGATED_ADDRESS,
            Ok(encode(1002).to_tagged().to_vec()),
        );
        let n = Normalizer::new(&host);
        let addr = encode(1001);
        let once = n.normalize(&addr);

        assert_eq!(once, addr);
        assert_eq!(n.normalize(&once), once);
    }
}
