pub mod rectangle_overlay;
