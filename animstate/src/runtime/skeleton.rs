use crate::SkeletonData;
use std::sync::Arc;

/// Local pose of one bone. Animations write these fields directly.
#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,

    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub shear_x: f32,
    pub shear_y: f32,
}

impl Bone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(index, b)| Bone {
                data_index: index,
                parent: b.parent,
                x: b.x,
                y: b.y,
                rotation: b.rotation,
                scale_x: b.scale_x,
                scale_y: b.scale_y,
                shear_x: b.shear_x,
                shear_y: b.shear_y,
            })
            .collect();
        Self { data, bones }
    }

    pub fn set_to_setup_pose(&mut self) {
        let data = self.data.clone();
        for (bone, setup) in self.bones.iter_mut().zip(&data.bones) {
            bone.x = setup.x;
            bone.y = setup.y;
            bone.rotation = setup.rotation;
            bone.scale_x = setup.scale_x;
            bone.scale_y = setup.scale_y;
            bone.shear_x = setup.shear_x;
            bone.shear_y = setup.shear_y;
        }
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        let index = self.data.find_bone(name)?;
        self.bones.get(index)
    }
}
