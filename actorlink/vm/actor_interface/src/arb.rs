// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use arbitrary::Unstructured;
use quickcheck::Gen;

use crate::eam::{RawAddress, ADDRESS_LEN};

impl quickcheck::Arbitrary for RawAddress {
    fn arbitrary(g: &mut Gen) -> Self {
        // Random bytes practically never look like a masked ID, so mix those in explicitly.
        if <u8 as quickcheck::Arbitrary>::arbitrary(g) % 3 == 0 {
            RawAddress::from_id(<u64 as quickcheck::Arbitrary>::arbitrary(g))
        } else {
            RawAddress(std::array::from_fn(|_| {
                <u8 as quickcheck::Arbitrary>::arbitrary(g)
            }))
        }
    }
}

impl arbitrary::Arbitrary<'_> for RawAddress {
    fn arbitrary(u: &mut Unstructured<'_>) -> arbitrary::Result<Self> {
        if u.arbitrary::<u8>()? % 3 == 0 {
            Ok(RawAddress::from_id(u.arbitrary()?))
        } else {
            Ok(RawAddress(u.arbitrary::<[u8; ADDRESS_LEN]>()?))
        }
    }
}
