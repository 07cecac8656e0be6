//! Reference filters for use with `filter`.
//!
//! All of them are pure predicates, so the order they are applied in only
//! changes intermediate list sizes, never the final result.

use dds_types::{AddressRef, ChainMetadata, ContractMetadata, ContractType, Version};

use crate::traits::FilterFn;

fn keep<R, P>(predicate: P) -> FilterFn<R>
where
    R: 'static,
    P: Fn(&R) -> bool + Send + Sync + 'static,
{
    Box::new(move |records: Vec<R>| records.into_iter().filter(|r| predicate(r)).collect())
}

pub fn address_ref_by_chain_selector(chain_selector: u64) -> FilterFn<AddressRef> {
    keep(move |r: &AddressRef| r.chain_selector == chain_selector)
}

pub fn address_ref_by_type(contract_type: impl Into<ContractType>) -> FilterFn<AddressRef> {
    let contract_type = contract_type.into();
    keep(move |r: &AddressRef| r.contract_type == contract_type)
}

pub fn address_ref_by_version(version: Version) -> FilterFn<AddressRef> {
    keep(move |r: &AddressRef| r.version == version)
}

pub fn address_ref_by_qualifier(qualifier: impl Into<String>) -> FilterFn<AddressRef> {
    let qualifier = qualifier.into();
    keep(move |r: &AddressRef| r.qualifier == qualifier)
}

pub fn address_ref_by_address(address: impl Into<String>) -> FilterFn<AddressRef> {
    let address = address.into();
    keep(move |r: &AddressRef| r.address == address)
}

/// Address-keyed lookup path: matches on `(address, chain_selector)` and
/// ignores type, version and qualifier.
pub fn address_ref_by_address_and_chain(
    address: impl Into<String>,
    chain_selector: u64,
) -> FilterFn<AddressRef> {
    let address = address.into();
    keep(move |r: &AddressRef| r.address == address && r.chain_selector == chain_selector)
}

pub fn chain_metadata_by_chain_selector(chain_selector: u64) -> FilterFn<ChainMetadata> {
    keep(move |r: &ChainMetadata| r.chain_selector == chain_selector)
}

pub fn contract_metadata_by_chain_selector(chain_selector: u64) -> FilterFn<ContractMetadata> {
    keep(move |r: &ContractMetadata| r.chain_selector == chain_selector)
}

pub fn contract_metadata_by_address(address: impl Into<String>) -> FilterFn<ContractMetadata> {
    let address = address.into();
    keep(move |r: &ContractMetadata| r.address == address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::apply_filters;
    use dds_types::Metadata;

    fn refs() -> Vec<AddressRef> {
        vec![
            AddressRef::new("0x1", 1, "Router", Version::new(1, 0, 0)),
            AddressRef::new("0x2", 1, "OnRamp", Version::new(1, 5, 0)).with_qualifier("lane-a"),
            AddressRef::new("0x1", 2, "Router", Version::new(1, 0, 0)),
        ]
    }

    #[test]
    fn by_chain_selector() {
        let out = apply_filters(refs(), &[address_ref_by_chain_selector(1)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn composed_filters_commute() {
        let a = apply_filters(
            refs(),
            &[address_ref_by_type("Router"), address_ref_by_chain_selector(2)],
        );
        let b = apply_filters(
            refs(),
            &[address_ref_by_chain_selector(2), address_ref_by_type("Router")],
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn by_version_and_qualifier() {
        let out = apply_filters(
            refs(),
            &[
                address_ref_by_version(Version::new(1, 5, 0)),
                address_ref_by_qualifier("lane-a"),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].address, "0x2");
    }

    #[test]
    fn address_paths() {
        assert_eq!(apply_filters(refs(), &[address_ref_by_address("0x1")]).len(), 2);
        let out = apply_filters(refs(), &[address_ref_by_address_and_chain("0x1", 2)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chain_selector, 2);
    }

    #[test]
    fn metadata_filters() {
        let chains = vec![
            ChainMetadata::new(1, Metadata::null()),
            ChainMetadata::new(2, Metadata::null()),
        ];
        assert_eq!(apply_filters(chains, &[chain_metadata_by_chain_selector(2)]).len(), 1);

        let contracts = vec![
            ContractMetadata::new("0xa", 1, Metadata::null()),
            ContractMetadata::new("0xb", 1, Metadata::null()),
            ContractMetadata::new("0xa", 2, Metadata::null()),
        ];
        assert_eq!(
            apply_filters(contracts.clone(), &[contract_metadata_by_chain_selector(1)]).len(),
            2
        );
        assert_eq!(apply_filters(contracts, &[contract_metadata_by_address("0xa")]).len(), 2);
    }
}
