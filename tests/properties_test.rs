//! Property tests for ordering and escaping.

mod common;

use common::{attribute_values, elements};
use folio::Book;
use folio::export::{v2, v3};
use proptest::prelude::*;

fn orders() -> impl Strategy<Value = Vec<Option<i32>>> {
    prop::collection::vec(prop::option::of(-5i32..5), 0..20)
}

fn toc() -> impl Strategy<Value = Vec<(i32, Vec<(i32, Vec<i32>)>)>> {
    prop::collection::vec(
        (
            -3i32..3,
            prop::collection::vec((-3i32..3, prop::collection::vec(-3i32..3, 0..3)), 0..4),
        ),
        0..6,
    )
}

fn book_with_toc(tree: &[(i32, Vec<(i32, Vec<i32>)>)]) -> (Book, usize) {
    let mut book = Book::new();
    let mut count = 0;
    for (i, (order, children)) in tree.iter().enumerate() {
        let top = book.add_navpoint(format!("T{i}"), format!("t{i}.xhtml"), *order);
        count += 1;
        for (j, (order, grandchildren)) in children.iter().enumerate() {
            let child = top.add_navpoint(format!("C{i}.{j}"), format!("t{i}.xhtml#c{j}"), *order);
            count += 1;
            for (k, order) in grandchildren.iter().enumerate() {
                child.add_navpoint(format!("G{i}.{j}.{k}"), format!("t{i}.xhtml#g{j}{k}"), *order);
                count += 1;
            }
        }
    }
    (book, count)
}

proptest! {
    #[test]
    fn prop_spine_is_stable_sort_by_order(orders in orders()) {
        let mut book = Book::new();
        for (i, order) in orders.iter().enumerate() {
            book.add_xhtml(format!("doc{i}.xhtml"), "", *order);
        }

        let mut expected: Vec<usize> = (0..orders.len()).collect();
        expected.sort_by_key(|&i| orders[i].unwrap_or(0));
        let expected: Vec<String> = expected.iter().map(|i| format!("doc{i}.xhtml")).collect();

        let spine: Vec<String> = book.spine().iter().map(|d| d.path.clone()).collect();
        prop_assert_eq!(spine, expected);
    }

    #[test]
    fn prop_spine_matches_package(orders in orders()) {
        let mut book = Book::new();
        for (i, order) in orders.iter().enumerate() {
            book.add_xhtml(format!("doc{i}.xhtml"), "", *order);
        }

        let ids: Vec<String> = book.spine().iter().map(|d| d.id.to_string()).collect();
        let opf = v2::package_document(&book);
        prop_assert_eq!(attribute_values(&opf, "itemref", "idref"), ids.clone());
        let opf = v3::package_document(&book, chrono::Utc::now());
        prop_assert_eq!(attribute_values(&opf, "itemref", "idref"), ids);
    }

    #[test]
    fn prop_play_order_is_contiguous(tree in toc()) {
        let (book, count) = book_with_toc(&tree);
        let ncx = v2::ncx(&book);

        let play_orders: Vec<usize> = attribute_values(&ncx, "navPoint", "playOrder")
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();
        prop_assert_eq!(play_orders, (1..=count).collect::<Vec<_>>());

        let mut ids = attribute_values(&ncx, "navPoint", "id");
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn prop_nav_document_lists_every_entry(tree in toc()) {
        let (book, count) = book_with_toc(&tree);
        let nav = v3::nav_document(&book);
        prop_assert_eq!(elements(&nav, "a").len(), count);
        prop_assert_eq!(elements(&nav, "li").len(), count);
    }

    #[test]
    fn prop_metadata_is_escaped(title in "\\PC{0,30}", author in "\\PC{0,30}") {
        let mut book = Book::new();
        book.set_title(title);
        book.add_author(author);
        book.add_publisher("<b>&\"'</b>");

        // parsing panics on malformed markup
        prop_assert_eq!(elements(&v2::package_document(&book), "dc:title").len(), 1);
        prop_assert_eq!(elements(&v3::package_document(&book, chrono::Utc::now()), "dc:creator").len(), 1);
        prop_assert_eq!(elements(&v2::ncx(&book), "docAuthor").len(), 1);
    }
}
